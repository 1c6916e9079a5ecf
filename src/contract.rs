//! Typed Safe contract binding
//!
//! Calldata is assembled from canonical function signatures; selectors
//! are computed rather than hard-coded. Reads decode ledger-native
//! integers into full-width types.

use crate::error::{SafeError, SafeResult};
use crate::provider::{CallRequest, Provider};
use crate::types::{Operation, SafeTransactionData};
use ethers_core::abi::{decode, encode, ParamType, Token};
use ethers_core::types::{Address, Bytes, H256, U256};
use ethers_core::utils::keccak256;
use std::sync::Arc;

/// First 4 bytes of keccak256(signature)
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Selector plus ABI-encoded arguments
pub fn encode_call(signature: &str, tokens: &[Token]) -> Bytes {
    let mut data = selector(signature).to_vec();
    data.extend(encode(tokens));
    Bytes::from(data)
}

/// Calldata for the internal gas probe
pub fn required_tx_gas_calldata(
    to: Address,
    value: U256,
    data: &Bytes,
    operation: Operation,
) -> Bytes {
    encode_call(
        "requiredTxGas(address,uint256,bytes,uint8)",
        &[
            Token::Address(to),
            Token::Uint(value),
            Token::Bytes(data.to_vec()),
            Token::Uint(U256::from(u8::from(operation))),
        ],
    )
}

/// Read/write surface of a deployed Safe account contract
#[derive(Clone)]
pub struct SafeContract {
    address: Address,
    provider: Arc<dyn Provider>,
}

impl SafeContract {
    pub fn new(address: Address, provider: Arc<dyn Provider>) -> Self {
        Self { address, provider }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    async fn read(&self, data: Bytes, output: &[ParamType]) -> SafeResult<Vec<Token>> {
        let request = CallRequest {
            to: self.address,
            data: Some(data),
            ..Default::default()
        };
        let raw = self.provider.call(&request).await?;
        decode(output, &raw).map_err(|e| SafeError::abi(format!("Failed to decode return data: {}", e)))
    }

    pub async fn get_owners(&self) -> SafeResult<Vec<Address>> {
        let tokens = self
            .read(
                encode_call("getOwners()", &[]),
                &[ParamType::Array(Box::new(ParamType::Address))],
            )
            .await?;
        let owners = tokens
            .into_iter()
            .next()
            .and_then(Token::into_array)
            .ok_or_else(|| SafeError::abi("getOwners returned no array"))?
            .into_iter()
            .filter_map(Token::into_address)
            .collect();
        Ok(owners)
    }

    pub async fn get_threshold(&self) -> SafeResult<U256> {
        self.read_uint(encode_call("getThreshold()", &[])).await
    }

    pub async fn nonce(&self) -> SafeResult<U256> {
        self.read_uint(encode_call("nonce()", &[])).await
    }

    /// Non-zero when `owner` has pre-approved `hash` on-chain
    pub async fn approved_hashes(&self, owner: Address, hash: H256) -> SafeResult<U256> {
        self.read_uint(encode_call(
            "approvedHashes(address,bytes32)",
            &[
                Token::Address(owner),
                Token::FixedBytes(hash.as_bytes().to_vec()),
            ],
        ))
        .await
    }

    /// Canonical transaction hash, computed by the contract itself
    pub async fn get_transaction_hash(&self, tx: &SafeTransactionData) -> SafeResult<H256> {
        let data = encode_call(
            "getTransactionHash(address,uint256,bytes,uint8,uint256,uint256,uint256,address,address,uint256)",
            &[
                Token::Address(tx.to),
                Token::Uint(tx.value),
                Token::Bytes(tx.data.to_vec()),
                Token::Uint(U256::from(u8::from(tx.operation))),
                Token::Uint(tx.safe_tx_gas),
                Token::Uint(tx.base_gas),
                Token::Uint(tx.gas_price),
                Token::Address(tx.gas_token),
                Token::Address(tx.refund_receiver),
                Token::Uint(tx.nonce),
            ],
        );
        self.read_hash(data).await
    }

    /// Safe message hash via the fallback handler
    pub async fn get_message_hash(&self, message_hash: H256) -> SafeResult<H256> {
        let data = encode_call(
            "getMessageHash(bytes)",
            &[Token::Bytes(message_hash.as_bytes().to_vec())],
        );
        self.read_hash(data).await
    }

    /// On-chain contract version string
    pub async fn version(&self) -> SafeResult<String> {
        let tokens = self
            .read(encode_call("VERSION()", &[]), &[ParamType::String])
            .await?;
        tokens
            .into_iter()
            .next()
            .and_then(Token::into_string)
            .ok_or_else(|| SafeError::abi("VERSION returned no string"))
    }

    /// Calldata for the final authorized call
    pub fn exec_transaction_calldata(
        &self,
        tx: &SafeTransactionData,
        signatures: Bytes,
    ) -> Bytes {
        encode_call(
            "execTransaction(address,uint256,bytes,uint8,uint256,uint256,uint256,address,address,bytes)",
            &[
                Token::Address(tx.to),
                Token::Uint(tx.value),
                Token::Bytes(tx.data.to_vec()),
                Token::Uint(U256::from(u8::from(tx.operation))),
                Token::Uint(tx.safe_tx_gas),
                Token::Uint(tx.base_gas),
                Token::Uint(tx.gas_price),
                Token::Address(tx.gas_token),
                Token::Address(tx.refund_receiver),
                Token::Bytes(signatures.to_vec()),
            ],
        )
    }

    /// Calldata recording an owner's on-chain approval of `hash`
    pub fn approve_hash_calldata(&self, hash: H256) -> Bytes {
        encode_call(
            "approveHash(bytes32)",
            &[Token::FixedBytes(hash.as_bytes().to_vec())],
        )
    }

    async fn read_uint(&self, data: Bytes) -> SafeResult<U256> {
        let tokens = self.read(data, &[ParamType::Uint(256)]).await?;
        tokens
            .into_iter()
            .next()
            .and_then(Token::into_uint)
            .ok_or_else(|| SafeError::abi("Expected a uint256 return value"))
    }

    async fn read_hash(&self, data: Bytes) -> SafeResult<H256> {
        let tokens = self.read(data, &[ParamType::FixedBytes(32)]).await?;
        let bytes = tokens
            .into_iter()
            .next()
            .and_then(Token::into_fixed_bytes)
            .ok_or_else(|| SafeError::abi("Expected a bytes32 return value"))?;
        if bytes.len() != 32 {
            return Err(SafeError::abi(format!(
                "Expected 32 bytes, got {}",
                bytes.len()
            )));
        }
        Ok(H256::from_slice(&bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_is_keccak_prefix() {
        let expected = &keccak256(b"getOwners()")[..4];
        assert_eq!(selector("getOwners()"), expected);
    }

    #[test]
    fn test_encode_call_layout() {
        let data = encode_call(
            "approvedHashes(address,bytes32)",
            &[
                Token::Address(Address::repeat_byte(0x11)),
                Token::FixedBytes(vec![0x22; 32]),
            ],
        );
        assert_eq!(&data[..4], selector("approvedHashes(address,bytes32)"));
        // Two static words after the selector
        assert_eq!(data.len(), 4 + 64);
    }

    #[test]
    fn test_exec_transaction_calldata_embeds_signatures() {
        let provider_free = SafeContract::new(
            Address::repeat_byte(0xab),
            Arc::new(NullProvider),
        );
        let tx = SafeTransactionData {
            to: Address::repeat_byte(0x01),
            value: U256::zero(),
            data: Bytes::default(),
            operation: Operation::Call,
            safe_tx_gas: U256::zero(),
            base_gas: U256::zero(),
            gas_price: U256::zero(),
            gas_token: Address::zero(),
            refund_receiver: Address::zero(),
            nonce: U256::zero(),
        };
        let signatures = Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]);
        let calldata = provider_free.exec_transaction_calldata(&tx, signatures.clone());
        assert_eq!(
            &calldata[..4],
            selector("execTransaction(address,uint256,bytes,uint8,uint256,uint256,uint256,address,address,bytes)")
        );
        let hex = hex::encode(&calldata);
        assert!(hex.contains("deadbeef"));
    }

    struct NullProvider;

    #[async_trait::async_trait]
    impl Provider for NullProvider {
        async fn call(&self, _request: &CallRequest) -> SafeResult<Bytes> {
            Err(SafeError::internal("unused"))
        }
        async fn estimate_gas(&self, _request: &CallRequest) -> SafeResult<U256> {
            Err(SafeError::internal("unused"))
        }
        async fn balance_of(&self, _address: Address) -> SafeResult<U256> {
            Err(SafeError::internal("unused"))
        }
        async fn gas_price(&self) -> SafeResult<U256> {
            Err(SafeError::internal("unused"))
        }
        async fn transaction_count(&self, _address: Address) -> SafeResult<U256> {
            Err(SafeError::internal("unused"))
        }
        async fn send_raw_transaction(&self, _raw: Bytes) -> SafeResult<H256> {
            Err(SafeError::internal("unused"))
        }
    }
}
