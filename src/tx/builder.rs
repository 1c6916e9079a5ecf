//! Transaction standardization
//!
//! Resolves a caller's partial request into the canonical record the
//! contract hashes. The nonce is read before gas resolution because
//! safeTxGas estimation depends on the already-resolved call fields.

use crate::contract::SafeContract;
use crate::error::SafeResult;
use crate::gas::{resolve_safe_tx_gas, SafeTxGasOracle};
use crate::provider::Provider;
use crate::tx::SafeTransaction;
use crate::types::{Operation, SafeTransactionData, TransactionRequest};
use ethers_core::types::Address;
use semver::Version;

/// Fill a partial request with canonical defaults and a nonce
pub async fn standardize(
    request: TransactionRequest,
    contract: &SafeContract,
    provider: &dyn Provider,
    oracle: &dyn SafeTxGasOracle,
    version: &Version,
) -> SafeResult<SafeTransaction> {
    let operation = request.operation.unwrap_or(Operation::Call);
    let base_gas = request.base_gas.unwrap_or_default();
    let gas_price = request.gas_price.unwrap_or_default();
    let gas_token = request.gas_token.unwrap_or_else(Address::zero);
    let refund_receiver = request.refund_receiver.unwrap_or_else(Address::zero);

    let nonce = match request.nonce {
        Some(nonce) => nonce,
        None => contract.nonce().await?,
    };

    let estimate = resolve_safe_tx_gas(
        request.safe_tx_gas,
        crate::config::is_legacy_version(version),
        contract.address(),
        request.to,
        request.value,
        &request.data,
        operation,
        provider,
        oracle,
    )
    .await;

    Ok(SafeTransaction::new(SafeTransactionData {
        to: request.to,
        value: request.value,
        data: request.data,
        operation,
        safe_tx_gas: estimate.value,
        base_gas,
        gas_price,
        gas_token,
        refund_receiver,
        nonce,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::selector;
    use crate::error::{SafeError, SafeResult};
    use crate::provider::CallRequest;
    use async_trait::async_trait;
    use ethers_core::abi::Token;
    use ethers_core::types::{Bytes, H256, U256};
    use std::sync::Arc;

    /// Answers the nonce read and rejects estimation traffic
    struct NonceOnlyProvider {
        nonce: u64,
    }

    #[async_trait]
    impl Provider for NonceOnlyProvider {
        async fn call(&self, request: &CallRequest) -> SafeResult<Bytes> {
            let data = request.data.as_ref().expect("calls carry data");
            if data[..4] == selector("nonce()")[..] {
                let word = ethers_core::abi::encode(&[Token::Uint(U256::from(self.nonce))]);
                return Ok(Bytes::from(word));
            }
            Err(SafeError::execution_failed("execution reverted"))
        }
        async fn estimate_gas(&self, _request: &CallRequest) -> SafeResult<U256> {
            Err(SafeError::execution_failed("execution reverted"))
        }
        async fn balance_of(&self, _address: Address) -> SafeResult<U256> {
            unreachable!()
        }
        async fn gas_price(&self) -> SafeResult<U256> {
            unreachable!()
        }
        async fn transaction_count(&self, _address: Address) -> SafeResult<U256> {
            unreachable!()
        }
        async fn send_raw_transaction(&self, _raw: Bytes) -> SafeResult<H256> {
            unreachable!()
        }
    }

    struct FailingOracle;

    #[async_trait]
    impl SafeTxGasOracle for FailingOracle {
        async fn estimate_safe_tx_gas(
            &self,
            _safe: Address,
            _to: Address,
            _value: U256,
            _data: &Bytes,
            _operation: Operation,
        ) -> SafeResult<U256> {
            Err(SafeError::network("service unreachable"))
        }
    }

    #[tokio::test]
    async fn test_defaults_and_nonce_resolution() {
        let provider = Arc::new(NonceOnlyProvider { nonce: 42 });
        let contract = SafeContract::new(Address::repeat_byte(0xab), provider.clone());
        let version = Version::parse("1.3.0").unwrap();

        let tx = standardize(
            TransactionRequest {
                to: Address::repeat_byte(0x01),
                value: U256::from(5),
                ..Default::default()
            },
            &contract,
            provider.as_ref(),
            &FailingOracle,
            &version,
        )
        .await
        .unwrap();

        assert_eq!(tx.data.operation, Operation::Call);
        assert_eq!(tx.data.gas_token, Address::zero());
        assert_eq!(tx.data.refund_receiver, Address::zero());
        assert_eq!(tx.data.base_gas, U256::zero());
        assert_eq!(tx.data.gas_price, U256::zero());
        assert_eq!(tx.data.nonce, U256::from(42));
        // Modern account: no allowance, no estimation traffic
        assert_eq!(tx.data.safe_tx_gas, U256::zero());
    }

    #[tokio::test]
    async fn test_explicit_fields_survive() {
        let provider = Arc::new(NonceOnlyProvider { nonce: 42 });
        let contract = SafeContract::new(Address::repeat_byte(0xab), provider.clone());
        let version = Version::parse("1.1.1").unwrap();

        let tx = standardize(
            TransactionRequest {
                to: Address::repeat_byte(0x01),
                value: U256::zero(),
                operation: Some(Operation::DelegateCall),
                safe_tx_gas: Some(U256::from(33_000)),
                nonce: Some(U256::from(7)),
                gas_token: Some(Address::repeat_byte(0x05)),
                ..Default::default()
            },
            &contract,
            provider.as_ref(),
            &FailingOracle,
            &version,
        )
        .await
        .unwrap();

        assert_eq!(tx.data.operation, Operation::DelegateCall);
        assert_eq!(tx.data.safe_tx_gas, U256::from(33_000));
        assert_eq!(tx.data.nonce, U256::from(7));
        assert_eq!(tx.data.gas_token, Address::repeat_byte(0x05));
    }
}
