//! Core data model
//!
//! Transaction records move through three shapes: the caller's partial
//! `TransactionRequest`, the fully resolved `SafeTransactionData`, and
//! the on-chain `H256` transaction hash computed by the contract.

use ethers_core::types::{Address, Bytes, H256, U256};
use serde::{Deserialize, Serialize};

/// Kind of call performed by the Safe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Operation {
    Call,
    DelegateCall,
}

impl From<Operation> for u8 {
    fn from(op: Operation) -> u8 {
        match op {
            Operation::Call => 0,
            Operation::DelegateCall => 1,
        }
    }
}

impl TryFrom<u8> for Operation {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Operation::Call),
            1 => Ok(Operation::DelegateCall),
            other => Err(format!("Invalid operation: {}", other)),
        }
    }
}

/// Partial transaction supplied by the caller
///
/// Every `None` is resolved to a concrete value during standardization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub to: Address,
    pub value: U256,
    #[serde(default)]
    pub data: Bytes,
    pub operation: Option<Operation>,
    pub safe_tx_gas: Option<U256>,
    pub base_gas: Option<U256>,
    pub gas_price: Option<U256>,
    pub gas_token: Option<Address>,
    pub refund_receiver: Option<Address>,
    pub nonce: Option<U256>,
}

/// Fully standardized transaction record
///
/// Field-for-field equality implies an identical on-chain hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeTransactionData {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub operation: Operation,
    pub safe_tx_gas: U256,
    pub base_gas: U256,
    pub gas_price: U256,
    pub gas_token: Address,
    pub refund_receiver: Address,
    pub nonce: U256,
}

/// Account state as reported by the transaction service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeInfo {
    pub address: Address,
    pub fallback_handler: Address,
    pub guard: Address,
    pub master_copy: Address,
    pub modules: Vec<Address>,
    pub nonce: u64,
    pub owners: Vec<Address>,
    pub threshold: u64,
    pub version: String,
}

/// Account summary assembled from independent on-chain reads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicSafeInfo {
    pub address: Address,
    pub version: String,
    pub threshold: U256,
    pub nonce: U256,
    pub owners: Vec<Address>,
}

/// Caller-tunable knobs for execution submission
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    /// Gas price for the outer transaction; fetched from the node when
    /// not supplied.
    pub gas_price: Option<U256>,
}

/// Outcome of a successful execution submission
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub transaction_hash: H256,
    pub gas_limit: U256,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_serde_as_number() {
        let json = serde_json::to_string(&Operation::DelegateCall).unwrap();
        assert_eq!(json, "1");

        let op: Operation = serde_json::from_str("0").unwrap();
        assert_eq!(op, Operation::Call);

        assert!(serde_json::from_str::<Operation>("2").is_err());
    }

    #[test]
    fn test_transaction_request_defaults() {
        let request = TransactionRequest {
            to: Address::repeat_byte(0x11),
            value: U256::zero(),
            ..Default::default()
        };
        assert!(request.operation.is_none());
        assert!(request.nonce.is_none());
        assert!(request.data.is_empty());
    }

    #[test]
    fn test_standardized_equality_is_field_wise() {
        let data = SafeTransactionData {
            to: Address::repeat_byte(0x22),
            value: U256::from(1),
            data: Bytes::default(),
            operation: Operation::Call,
            safe_tx_gas: U256::zero(),
            base_gas: U256::zero(),
            gas_price: U256::zero(),
            gas_token: Address::zero(),
            refund_receiver: Address::zero(),
            nonce: U256::from(7),
        };
        let mut other = data.clone();
        assert_eq!(data, other);
        other.nonce = U256::from(8);
        assert_ne!(data, other);
    }
}
