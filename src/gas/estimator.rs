//! Gas estimation strategies
//!
//! The legacy path discovers the execution guard's gas appetite with a
//! read-only probe of `requiredTxGas`, then refines it with bounded
//! trial calls: the guard's true cost is only observable through the
//! success or failure of a gas-capped call, so the refinement is a
//! linear search with exponential step growth, capped at ten rounds.

use crate::contract::required_tx_gas_calldata;
use crate::error::SafeResult;
use crate::logging;
use crate::provider::{CallRequest, Provider};
use crate::types::Operation;
use async_trait::async_trait;
use ethers_core::types::{Address, Bytes, U256};

/// Safety margin added on top of the raw probe value
const PROBE_GAS_MARGIN: u64 = 10_000;

/// Initial refinement step; doubles every failed round
const REFINEMENT_BASE_GAS: u64 = 10_000;

/// Hard bound on refinement rounds
const REFINEMENT_ROUNDS: usize = 10;

/// Intrinsic cost of a calldata payload
///
/// Zero bytes cost 4 units, non-zero bytes 16; an empty payload costs
/// nothing.
pub fn data_gas(data: &[u8]) -> u64 {
    data.iter().map(|b| if *b == 0 { 4u64 } else { 16 }).sum()
}

/// External authority consulted before local estimation
#[async_trait]
pub trait SafeTxGasOracle: Send + Sync {
    async fn estimate_safe_tx_gas(
        &self,
        safe: Address,
        to: Address,
        value: U256,
        data: &Bytes,
        operation: Operation,
    ) -> SafeResult<U256>;
}

/// Estimation outcome that stays observable when it degrades
///
/// Estimation is best-effort: a failed remote or local estimate never
/// aborts standardization, but the reason is kept so callers can tell a
/// real zero from a fallback zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasEstimate {
    pub value: U256,
    pub degraded: Option<String>,
}

impl GasEstimate {
    pub fn exact(value: U256) -> Self {
        Self { value, degraded: None }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

/// Legacy estimation: probe `requiredTxGas`, refine, or fall back to a
/// direct estimate of the inner call
pub async fn estimate_tx_gas(
    provider: &dyn Provider,
    safe: Address,
    to: Address,
    value: U256,
    data: &Bytes,
    operation: Operation,
) -> SafeResult<U256> {
    let probe_calldata = required_tx_gas_calldata(to, value, data, operation);

    let mut tx_gas = U256::zero();
    if let Some(probed) = probe(provider, safe, &probe_calldata).await {
        tx_gas = probed + U256::from(PROBE_GAS_MARGIN);
    }

    if !tx_gas.is_zero() {
        let payload_gas = U256::from(data_gas(&probe_calldata));
        let mut additional = U256::from(REFINEMENT_BASE_GAS);
        for _ in 0..REFINEMENT_ROUNDS {
            let request = CallRequest {
                from: Some(safe),
                to: safe,
                data: Some(probe_calldata.clone()),
                gas: Some(tx_gas + payload_gas + additional),
                gas_price: Some(U256::zero()),
                ..Default::default()
            };
            match provider.call(&request).await {
                Ok(output) if !output.is_empty() => break,
                _ => {}
            }
            tx_gas = tx_gas + additional;
            additional = additional * U256::from(2);
        }
        return Ok(tx_gas + additional);
    }

    // Probe unavailable: estimate the inner call directly
    let direct = CallRequest {
        from: Some(safe),
        to,
        value: Some(value),
        data: Some(data.clone()),
        ..Default::default()
    };
    match provider.estimate_gas(&direct).await {
        Ok(gas) => Ok(gas),
        // Delegate calls cannot be simulated from the outside; resolve
        // to zero rather than failing the whole standardization.
        Err(_) if operation == Operation::DelegateCall => Ok(U256::zero()),
        Err(e) => Err(e),
    }
}

/// Read-only probe of the execution guard
///
/// The gas value sits in the trailing 32 bytes of the raw return
/// buffer. A revert or short buffer means the probe is unusable.
async fn probe(provider: &dyn Provider, safe: Address, calldata: &Bytes) -> Option<U256> {
    let request = CallRequest {
        from: Some(safe),
        to: safe,
        data: Some(calldata.clone()),
        ..Default::default()
    };
    let output = provider.call(&request).await.ok()?;
    if output.len() < 32 {
        return None;
    }
    Some(U256::from_big_endian(&output[output.len() - 32..]))
}

/// Resolve the safeTxGas field for a transaction under standardization
///
/// An explicit caller value always wins. Modern accounts need no
/// allowance. Legacy accounts consult the estimation service first and
/// fall back to local probing; every failure degrades to zero.
pub async fn resolve_safe_tx_gas(
    explicit: Option<U256>,
    legacy: bool,
    safe: Address,
    to: Address,
    value: U256,
    data: &Bytes,
    operation: Operation,
    provider: &dyn Provider,
    oracle: &dyn SafeTxGasOracle,
) -> GasEstimate {
    if let Some(value) = explicit {
        return GasEstimate::exact(value);
    }
    if !legacy {
        return GasEstimate::exact(U256::zero());
    }

    let remote_failure = match oracle
        .estimate_safe_tx_gas(safe, to, value, data, operation)
        .await
    {
        Ok(gas) => return GasEstimate::exact(gas),
        Err(e) => e,
    };

    match estimate_tx_gas(provider, safe, to, value, data, operation).await {
        Ok(gas) => {
            let reason = format!("estimation service unavailable: {}", remote_failure.message);
            logging::warn("gas", "Falling back to local safeTxGas estimation")
                .address_field("safe", safe)
                .field("reason", &reason)
                .log();
            GasEstimate { value: gas, degraded: Some(reason) }
        }
        Err(local_failure) => {
            let reason = format!(
                "estimation unavailable (service: {}; local: {})",
                remote_failure.message, local_failure.message
            );
            logging::warn("gas", "safeTxGas estimation degraded to 0")
                .address_field("safe", safe)
                .field("reason", &reason)
                .log();
            GasEstimate { value: U256::zero(), degraded: Some(reason) }
        }
    }
}
