//! Signature handling
//!
//! `codec` normalizes and classifies raw ECDSA signatures; `set` owns
//! the per-transaction aggregate and the threshold gate.

pub mod codec;
pub mod set;

pub use codec::{
    adjust_v, is_signed_with_prefix, pre_validated_signature, recover_signer, SafeSignature,
    SignatureError, SignatureKind,
};
pub use set::{SignatureSet, TxState};
