//! safeTxGas estimation
//!
//! Accounts below the 1.3.0 contract version require a gas allowance
//! for their internal execution guard; newer accounts do not. The
//! estimator picks the strategy from the account version and degrades
//! to a conservative default instead of failing.

pub mod estimator;

pub use estimator::{
    data_gas, estimate_tx_gas, resolve_safe_tx_gas, GasEstimate, SafeTxGasOracle,
};
