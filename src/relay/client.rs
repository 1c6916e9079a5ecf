//! REST client for the Safe transaction service

use crate::config::{validate_service_host, Network};
use crate::error::{SafeError, SafeResult};
use crate::gas::SafeTxGasOracle;
use crate::types::{Operation, SafeInfo, SafeTransactionData};
use async_trait::async_trait;
use ethers_core::types::{Address, Bytes, H256, U256};
use ethers_core::utils::to_checksum;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One owner's recorded confirmation of a pending transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    pub owner: Address,
    pub submission_date: String,
    pub transaction_hash: Option<H256>,
    pub signature: Bytes,
    pub signature_type: Option<String>,
}

/// A multisig transaction as reported by the service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTransaction {
    pub safe: Address,
    pub to: Address,
    pub value: String,
    pub data: Option<Bytes>,
    pub operation: u8,
    pub gas_token: Address,
    pub safe_tx_gas: u64,
    pub base_gas: u64,
    pub gas_price: String,
    pub refund_receiver: Address,
    pub nonce: u64,
    pub execution_date: Option<String>,
    pub submission_date: String,
    pub modified: Option<String>,
    pub block_number: Option<u64>,
    pub transaction_hash: Option<H256>,
    pub safe_tx_hash: H256,
    pub executor: Option<Address>,
    pub is_executed: bool,
    #[serde(default)]
    pub confirmations: Vec<Confirmation>,
    pub signatures: Option<Bytes>,
}

/// Proposal payload for a new multisig transaction
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposeTransactionBody {
    pub safe: String,
    pub to: String,
    pub value: String,
    pub data: Option<Bytes>,
    pub operation: u8,
    pub gas_token: Address,
    pub safe_tx_gas: u64,
    pub base_gas: u64,
    pub gas_price: String,
    pub refund_receiver: Address,
    pub nonce: u64,
    pub contract_transaction_hash: String,
    pub sender: String,
    pub signature: String,
}

impl ProposeTransactionBody {
    pub fn from_transaction(
        safe: Address,
        tx: &SafeTransactionData,
        hash: H256,
        sender: Address,
        signatures: &Bytes,
    ) -> SafeResult<Self> {
        Ok(Self {
            safe: to_checksum(&safe, None),
            to: to_checksum(&tx.to, None),
            value: tx.value.to_string(),
            data: if tx.data.is_empty() { None } else { Some(tx.data.clone()) },
            operation: u8::from(tx.operation),
            gas_token: tx.gas_token,
            safe_tx_gas: narrow(tx.safe_tx_gas, "safeTxGas")?,
            base_gas: narrow(tx.base_gas, "baseGas")?,
            gas_price: tx.gas_price.to_string(),
            refund_receiver: tx.refund_receiver,
            nonce: narrow(tx.nonce, "nonce")?,
            contract_transaction_hash: hex_hash(hash),
            sender: to_checksum(&sender, None),
            signature: hex_bytes(signatures),
        })
    }
}

/// Off-chain message state held by the service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeMessage {
    pub message_hash: H256,
    #[serde(default)]
    pub confirmations: Vec<MessageConfirmation>,
    pub prepared_signature: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageConfirmation {
    pub owner: Address,
    pub signature: Bytes,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    results: Vec<T>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EstimationRequest {
    to: String,
    value: String,
    data: Option<Bytes>,
    operation: u8,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EstimationResponse {
    safe_tx_gas: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ConfirmationBody {
    signature: String,
}

#[derive(Debug, Serialize)]
struct MessageBody {
    message: String,
    signature: String,
}

/// Client for one network's transaction service
pub struct TransactionService {
    host: String,
    client: reqwest::Client,
}

impl TransactionService {
    pub fn new(network: Network) -> SafeResult<Self> {
        Self::with_host(network.transaction_service_host())
    }

    /// Point the client at a self-hosted service
    pub fn with_host(host: &str) -> SafeResult<Self> {
        let host = validate_service_host(host)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SafeError::network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { host, client })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub async fn get_safe_info(&self, address: Address) -> SafeResult<SafeInfo> {
        let url = format!("{}/safes/{}/", self.host, to_checksum(&address, None));
        let response = self.client.get(&url).send().await?;
        Self::expect_success(&url, response.status())?;
        Ok(response.json().await?)
    }

    /// Unexecuted transactions at or above the given nonce
    pub async fn get_pending_transactions(
        &self,
        address: Address,
        nonce: U256,
    ) -> SafeResult<Vec<ServiceTransaction>> {
        let url = format!(
            "{}/safes/{}/multisig-transactions/",
            self.host,
            to_checksum(&address, None)
        );
        let nonce = nonce.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[("executed", "false"), ("nonce__gte", nonce.as_str())])
            .send()
            .await?;
        Self::expect_success(&url, response.status())?;
        let page: Page<ServiceTransaction> = response.json().await?;
        Ok(page.results)
    }

    pub async fn propose_transaction(
        &self,
        address: Address,
        body: &ProposeTransactionBody,
    ) -> SafeResult<()> {
        let url = format!(
            "{}/safes/{}/multisig-transactions/",
            self.host,
            to_checksum(&address, None)
        );
        let response = self.client.post(&url).json(body).send().await?;
        Self::expect_success_with_body(&url, response).await
    }

    pub async fn confirm_transaction(&self, hash: H256, signature: &Bytes) -> SafeResult<()> {
        let url = format!("{}/multisig-transactions/{}/confirmations/", self.host, hex_hash(hash));
        let body = ConfirmationBody { signature: hex_bytes(signature) };
        let response = self.client.post(&url).json(&body).send().await?;
        Self::expect_success_with_body(&url, response).await
    }

    pub async fn add_message(
        &self,
        address: Address,
        message: &str,
        signature: &Bytes,
    ) -> SafeResult<()> {
        let url = format!("{}/safes/{}/messages/", self.host, to_checksum(&address, None));
        let body = MessageBody {
            message: message.to_string(),
            signature: hex_bytes(signature),
        };
        let response = self.client.post(&url).json(&body).send().await?;
        Self::expect_success_with_body(&url, response).await
    }

    pub async fn get_message(&self, message_hash: H256) -> SafeResult<SafeMessage> {
        let url = format!("{}/messages/{}/", self.host, hex_hash(message_hash));
        let response = self.client.get(&url).send().await?;
        Self::expect_success(&url, response.status())?;
        Ok(response.json().await?)
    }

    fn expect_success(url: &str, status: reqwest::StatusCode) -> SafeResult<()> {
        if status.is_success() {
            Ok(())
        } else {
            Err(SafeError::network(format!("{} returned {}", url, status)))
        }
    }

    async fn expect_success_with_body(url: &str, response: reqwest::Response) -> SafeResult<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(SafeError::network(format!("{} returned {}: {}", url, status, body)))
    }
}

#[async_trait]
impl SafeTxGasOracle for TransactionService {
    async fn estimate_safe_tx_gas(
        &self,
        safe: Address,
        to: Address,
        value: U256,
        data: &Bytes,
        operation: Operation,
    ) -> SafeResult<U256> {
        let url = format!(
            "{}/safes/{}/multisig-transactions/estimations/",
            self.host,
            to_checksum(&safe, None)
        );
        let body = EstimationRequest {
            to: to_checksum(&to, None),
            value: value.to_string(),
            data: if data.is_empty() { None } else { Some(data.clone()) },
            operation: u8::from(operation),
        };
        let response = self.client.post(&url).json(&body).send().await?;
        Self::expect_success(&url, response.status())?;
        let estimation: EstimationResponse = response.json().await?;
        parse_gas_value(&estimation.safe_tx_gas)
    }
}

/// Full-width hex encoding of a hash (H256's Display abbreviates)
fn hex_hash(hash: H256) -> String {
    format!("0x{}", hex::encode(hash))
}

fn hex_bytes(bytes: &Bytes) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// The service reports safeTxGas as either a number or a decimal string
fn parse_gas_value(value: &serde_json::Value) -> SafeResult<U256> {
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| SafeError::parse_error("Non-integral safeTxGas")),
        serde_json::Value::String(s) => U256::from_dec_str(s)
            .map_err(|e| SafeError::parse_error(format!("Invalid safeTxGas: {}", e))),
        other => Err(SafeError::parse_error(format!("Unexpected safeTxGas: {}", other))),
    }
}

fn narrow(value: U256, field: &str) -> SafeResult<u64> {
    u64::try_from(value)
        .map_err(|_| SafeError::parse_error(format!("{} exceeds 64 bits", field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn sample_tx() -> SafeTransactionData {
        SafeTransactionData {
            to: Address::from_str("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap(),
            value: U256::from(1_000_000_000_000_000_000u64),
            data: Bytes::from(vec![0xde, 0xad]),
            operation: Operation::Call,
            safe_tx_gas: U256::from(50_000),
            base_gas: U256::zero(),
            gas_price: U256::zero(),
            gas_token: Address::zero(),
            refund_receiver: Address::zero(),
            nonce: U256::from(3),
        }
    }

    #[test]
    fn test_propose_body_field_names() {
        let body = ProposeTransactionBody::from_transaction(
            Address::repeat_byte(0x11),
            &sample_tx(),
            H256::repeat_byte(0xcd),
            Address::repeat_byte(0x22),
            &Bytes::from(vec![0xaa; 65]),
        )
        .unwrap();

        let json = serde_json::to_value(&body).unwrap();
        let object = json.as_object().unwrap();
        for key in [
            "safe",
            "to",
            "value",
            "data",
            "operation",
            "gasToken",
            "safeTxGas",
            "baseGas",
            "gasPrice",
            "refundReceiver",
            "nonce",
            "contractTransactionHash",
            "sender",
            "signature",
        ] {
            assert!(object.contains_key(key), "missing {}", key);
        }
        assert_eq!(json["value"], "1000000000000000000");
        assert_eq!(json["operation"], 0);
        assert_eq!(json["safeTxGas"], 50_000);
        assert_eq!(
            json["contractTransactionHash"],
            format!("0x{}", "cd".repeat(32))
        );
    }

    #[test]
    fn test_propose_body_checksums_addresses() {
        let body = ProposeTransactionBody::from_transaction(
            Address::from_str("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap(),
            &sample_tx(),
            H256::zero(),
            Address::from_str("0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359").unwrap(),
            &Bytes::default(),
        )
        .unwrap();
        assert_eq!(body.safe, "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
        assert_eq!(body.sender, "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359");
    }

    #[test]
    fn test_service_transaction_deserializes() {
        let json = serde_json::json!({
            "safe": "0x1111111111111111111111111111111111111111",
            "to": "0x2222222222222222222222222222222222222222",
            "value": "0",
            "data": null,
            "operation": 0,
            "gasToken": "0x0000000000000000000000000000000000000000",
            "safeTxGas": 0,
            "baseGas": 0,
            "gasPrice": "0",
            "refundReceiver": "0x0000000000000000000000000000000000000000",
            "nonce": 5,
            "executionDate": null,
            "submissionDate": "2021-09-01T10:00:00Z",
            "modified": "2021-09-01T10:00:00Z",
            "blockNumber": null,
            "transactionHash": null,
            "safeTxHash": format!("0x{}", "ab".repeat(32)),
            "executor": null,
            "isExecuted": false,
            "confirmations": [{
                "owner": "0x3333333333333333333333333333333333333333",
                "submissionDate": "2021-09-01T10:05:00Z",
                "transactionHash": null,
                "signature": "0x01",
                "signatureType": "EOA"
            }],
            "signatures": null
        });
        let tx: ServiceTransaction = serde_json::from_value(json).unwrap();
        assert_eq!(tx.nonce, 5);
        assert!(!tx.is_executed);
        assert_eq!(tx.confirmations.len(), 1);
        assert_eq!(tx.safe_tx_hash, H256::repeat_byte(0xab));
    }

    #[test]
    fn test_parse_gas_value_variants() {
        assert_eq!(
            parse_gas_value(&serde_json::json!(43_845)).unwrap(),
            U256::from(43_845)
        );
        assert_eq!(
            parse_gas_value(&serde_json::json!("43845")).unwrap(),
            U256::from(43_845)
        );
        assert!(parse_gas_value(&serde_json::json!(null)).is_err());
    }

    #[test]
    fn test_host_is_normalized() {
        let service = TransactionService::with_host("https://safe.example.org/api/v1/").unwrap();
        assert_eq!(service.host(), "https://safe.example.org/api/v1");
    }

    #[test]
    fn test_known_networks_construct() {
        for network in Network::ALL {
            assert!(TransactionService::new(network).is_ok());
        }
    }
}
