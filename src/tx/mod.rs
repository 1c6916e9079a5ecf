//! Safe transaction values
//!
//! A `SafeTransaction` couples the standardized record with the
//! signature set collected for it. The set is owned here exclusively;
//! callers serialize reuse of the same transaction themselves.

pub mod builder;

pub use builder::standardize;

use crate::signature::{SafeSignature, SignatureSet, TxState};
use crate::types::SafeTransactionData;
use ethers_core::types::{Bytes, U256};
use serde::{Deserialize, Serialize};

/// A standardized transaction and its collected signatures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafeTransaction {
    pub data: SafeTransactionData,
    pub signatures: SignatureSet,
    /// Terminal state stamped by the dispatcher
    #[serde(skip)]
    terminal: Option<TxState>,
}

impl SafeTransaction {
    pub fn new(data: SafeTransactionData) -> Self {
        Self {
            data,
            signatures: SignatureSet::new(),
            terminal: None,
        }
    }

    /// Insert or replace a signature by owner address
    pub fn add_signature(&mut self, signature: SafeSignature) {
        self.signatures.add(signature);
    }

    /// Lifecycle state for the given threshold
    pub fn state(&self, threshold: U256) -> TxState {
        self.terminal
            .unwrap_or_else(|| self.signatures.state(threshold))
    }

    pub(crate) fn mark_executed(&mut self) {
        self.terminal = Some(TxState::Executed);
    }

    pub(crate) fn mark_failed(&mut self) {
        self.terminal = Some(TxState::Failed);
    }

    /// Verifier-ready signature bytes, ascending by owner address
    pub fn encoded_signatures(&self) -> Bytes {
        self.signatures.encoded()
    }
}
