//! Safe multisig coordination core
//!
//! Library for orchestrating transactions from a threshold
//! multisignature account: standardize a partial request, hash it
//! through the on-chain oracle, collect and normalize owner
//! signatures, merge on-chain approvals, and execute once the quorum
//! gate passes.
//!
//! # Architecture
//!
//! - **safe**: the per-account orchestrator and execution dispatcher
//! - **tx**: transaction values and standardization
//! - **signature**: ECDSA codec, aggregation and the threshold gate
//! - **gas**: safeTxGas estimation strategies
//! - **contract**: typed Safe contract binding
//! - **provider**: JSON-RPC ledger transport (trait + HTTP impl)
//! - **relay**: transaction service REST client
//! - **config**: supported networks and version validation
//!
//! Collaborators are injected: construct a [`provider::HttpProvider`]
//! (or any [`provider::Provider`] implementation) and hand it to
//! [`safe::Safe`]; nothing in this crate holds global state.
//!
//! # Example
//!
//! ```rust,ignore
//! use safe_core::{config::Network, provider::HttpProvider, safe::Safe};
//! use std::sync::Arc;
//!
//! let provider = Arc::new(HttpProvider::new("https://cloudflare-eth.com")?);
//! let safe = Safe::new(address, "1.3.0", Network::Ethereum, provider)?;
//! let info = safe.get_basic_info().await?;
//! ```

pub mod config;
pub mod contract;
pub mod error;
pub mod gas;
pub mod logging;
pub mod provider;
pub mod relay;
pub mod safe;
pub mod signature;
pub mod tx;
pub mod types;

// Re-export key types for convenience
pub use config::Network;
pub use error::{ErrorCode, SafeError, SafeResult};
pub use gas::{GasEstimate, SafeTxGasOracle};
pub use provider::{CallRequest, HttpProvider, Provider};
pub use relay::TransactionService;
pub use safe::{MessageResult, MessageStatus, Safe};
pub use signature::{SafeSignature, SignatureKind, SignatureSet, TxState};
pub use tx::SafeTransaction;
pub use types::{
    BasicSafeInfo, ExecutionOptions, ExecutionResult, Operation, SafeInfo, SafeTransactionData,
    TransactionRequest,
};
