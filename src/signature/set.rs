//! Signature aggregation and the threshold gate
//!
//! The set is keyed by the owner address value, so a later signature
//! for the same owner replaces the earlier one and iteration order is
//! ascending address order, which is the encoding order the on-chain
//! verifier requires.

use crate::error::{SafeError, SafeResult};
use crate::signature::codec::SafeSignature;
use ethers_core::types::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle of a transaction's quorum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxState {
    /// Hash computed, no signatures yet
    Draft,
    /// At least one signature, below threshold
    PartiallySigned,
    /// Threshold reached, eligible for execution
    Ready,
    /// Submitted on-chain
    Executed,
    /// Rejected in pre-flight or reverted on-chain
    Failed,
}

/// Ordered, deduplicated collection of owner signatures
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignatureSet {
    entries: BTreeMap<Address, SafeSignature>,
}

impl SignatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a signature, replacing any earlier one from the same owner
    pub fn add(&mut self, signature: SafeSignature) {
        self.entries.insert(signature.signer, signature);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, owner: Address) -> bool {
        self.entries.contains_key(&owner)
    }

    pub fn get(&self, owner: Address) -> Option<&SafeSignature> {
        self.entries.get(&owner)
    }

    /// Signers in ascending address order
    pub fn signers(&self) -> impl Iterator<Item = Address> + '_ {
        self.entries.keys().copied()
    }

    /// Signatures in ascending signer address order
    pub fn iter(&self) -> impl Iterator<Item = &SafeSignature> {
        self.entries.values()
    }

    /// Current lifecycle state for the given threshold
    pub fn state(&self, threshold: U256) -> TxState {
        let collected = U256::from(self.entries.len());
        if collected.is_zero() {
            TxState::Draft
        } else if collected < threshold {
            TxState::PartiallySigned
        } else {
            TxState::Ready
        }
    }

    /// Threshold gate, with the exact user-facing shortfall wording
    pub fn require_threshold(&self, threshold: U256) -> SafeResult<()> {
        let collected = U256::from(self.entries.len());
        if collected >= threshold {
            return Ok(());
        }
        let missing = threshold - collected;
        let message = if missing == U256::one() {
            "There is 1 signature missing".to_string()
        } else {
            format!("There are {} signatures missing", missing)
        };
        Err(SafeError::insufficient_signatures(message))
    }

    /// Concatenate all signatures, sorted ascending by owner address
    ///
    /// Consumed exactly once, at execution submission.
    pub fn encoded(&self) -> Bytes {
        let mut out = Vec::with_capacity(self.entries.len() * 65);
        for signature in self.entries.values() {
            out.extend_from_slice(&signature.data);
        }
        Bytes::from(out)
    }
}
