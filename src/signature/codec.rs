//! ECDSA signature codec
//!
//! Signatures are 65-byte `r ‖ s ‖ v` values. The recovery byte encodes
//! two facts for the on-chain verifier: the curve recovery id (offset
//! 27) and whether the signer saw the personal-message prefix (offset
//! 4). Pre-validated owners use a fixed sentinel encoding instead of an
//! ECDSA triple.

use crate::error::{ErrorCode, SafeError};
use ethers_core::types::{Address, Bytes, H256};
use ethers_core::utils::keccak256;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1};
use serde::{Deserialize, Serialize};

/// Length of an encoded signature entry
pub const SIGNATURE_LENGTH: usize = 65;

const MIN_VALID_V: u8 = 27;
const ETH_SIGN_PREFIX_OFFSET: u8 = 4;

/// Errors raised while processing raw signature bytes
#[derive(Debug, Clone, thiserror::Error)]
pub enum SignatureError {
    #[error("Invalid signature: {0}")]
    InvalidFormat(String),
    #[error("Recovery failed: {0}")]
    RecoveryFailed(String),
}

impl From<SignatureError> for SafeError {
    fn from(e: SignatureError) -> Self {
        match e {
            SignatureError::InvalidFormat(msg) => {
                SafeError::new(ErrorCode::InvalidSignatureFormat, msg)
            }
            SignatureError::RecoveryFailed(msg) => {
                SafeError::new(ErrorCode::SigningFailed, msg)
            }
        }
    }
}

/// How a signature satisfies the verifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureKind {
    /// Detached ECDSA signature over the transaction hash
    EthSign,
    /// Sentinel for an owner who approved the hash on-chain
    PreValidated,
}

/// One owner's contribution to a transaction's quorum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeSignature {
    pub signer: Address,
    pub data: Bytes,
    pub kind: SignatureKind,
}

impl SafeSignature {
    pub fn eth_sign(signer: Address, data: impl Into<Bytes>) -> Self {
        Self {
            signer,
            data: data.into(),
            kind: SignatureKind::EthSign,
        }
    }
}

/// Normalize the recovery byte of a 65-byte signature
///
/// Raw `v` must be one of {0, 1, 27, 28}. Values below 27 are shifted
/// up; `had_prefix` additionally shifts by 4 so the verifier knows the
/// signer signed the prefixed personal-message variant.
pub fn adjust_v(signature: &[u8], had_prefix: bool) -> Result<Vec<u8>, SignatureError> {
    if signature.len() != SIGNATURE_LENGTH {
        return Err(SignatureError::InvalidFormat(format!(
            "Expected {} bytes, got {}",
            SIGNATURE_LENGTH,
            signature.len()
        )));
    }

    let mut v = signature[SIGNATURE_LENGTH - 1];
    if !matches!(v, 0 | 1 | 27 | 28) {
        return Err(SignatureError::InvalidFormat(format!(
            "Invalid recovery byte: {}",
            v
        )));
    }
    if v < MIN_VALID_V {
        v += MIN_VALID_V;
    }
    if had_prefix {
        v += ETH_SIGN_PREFIX_OFFSET;
    }

    let mut adjusted = signature.to_vec();
    adjusted[SIGNATURE_LENGTH - 1] = v;
    Ok(adjusted)
}

/// Recover the signer address from a signature over `digest`
pub fn recover_signer(digest: H256, signature: &[u8]) -> Result<Address, SignatureError> {
    if signature.len() != SIGNATURE_LENGTH {
        return Err(SignatureError::InvalidFormat(format!(
            "Expected {} bytes, got {}",
            SIGNATURE_LENGTH,
            signature.len()
        )));
    }

    let v = signature[SIGNATURE_LENGTH - 1];
    let recovery_id = if v >= MIN_VALID_V { v - MIN_VALID_V } else { v };
    let recovery_id = RecoveryId::from_i32(recovery_id as i32)
        .map_err(|e| SignatureError::RecoveryFailed(e.to_string()))?;

    let recoverable = RecoverableSignature::from_compact(&signature[..64], recovery_id)
        .map_err(|e| SignatureError::RecoveryFailed(e.to_string()))?;

    let message = Message::from_digest_slice(digest.as_bytes())
        .map_err(|e| SignatureError::RecoveryFailed(e.to_string()))?;

    let secp = Secp256k1::new();
    let public_key = secp
        .recover_ecdsa(&message, &recoverable)
        .map_err(|e| SignatureError::RecoveryFailed(e.to_string()))?;

    Ok(public_key_address(&public_key))
}

/// Address of a secp256k1 public key
pub fn public_key_address(public_key: &PublicKey) -> Address {
    let uncompressed = public_key.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);
    Address::from_slice(&hash[12..])
}

/// Infer whether a signature was produced over the prefixed
/// personal-message variant of `digest`
///
/// Recovery against the raw digest yielding a different address means
/// the signer must have signed a differently-encoded message. Recovery
/// failure is treated as "prefix present", never as an error.
pub fn is_signed_with_prefix(digest: H256, signature: &[u8], claimed_signer: Address) -> bool {
    match recover_signer(digest, signature) {
        Ok(recovered) => recovered != claimed_signer,
        Err(_) => true,
    }
}

/// Sentinel signature for an owner with an on-chain approval
///
/// Layout: 12 zero bytes, the owner address, 32 zero bytes, 0x01. The
/// verifier recognizes the trailing byte and skips the ECDSA check.
pub fn pre_validated_signature(owner: Address) -> SafeSignature {
    let mut data = Vec::with_capacity(SIGNATURE_LENGTH);
    data.extend_from_slice(&[0u8; 12]);
    data.extend_from_slice(owner.as_bytes());
    data.extend_from_slice(&[0u8; 32]);
    data.push(0x01);

    SafeSignature {
        signer: owner,
        data: Bytes::from(data),
        kind: SignatureKind::PreValidated,
    }
}
