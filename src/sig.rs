//! Signer recovery for blob transactions.
//!
//! All functions here are pure.

use alloy::primitives::{uint, Address, Signature, B256, U256};

/// Half the secp256k1 group order. Signatures with a larger `s` are
/// malleable and rejected.
pub const SECP256K1N_HALF: U256 =
    uint!(0x7FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF5D576E7357A4501DDFE92F46681B20A0_U256);

/// Error recovering or checking a transaction signature.
#[derive(thiserror::Error, Debug)]
pub enum SignatureError {
    /// The recovery parameter is not one of `0`, `1`, `27`, `28`.
    #[error("invalid recovery parameter {0}")]
    InvalidRecoveryParam(u64),

    /// `r` or `s` is zero.
    #[error("zero signature scalar")]
    ZeroScalar,

    /// `s` is in the upper half of the curve order.
    #[error("signature s value is too high")]
    HighS,

    /// The curve operation failed.
    #[error(transparent)]
    Recovery(#[from] alloy::primitives::SignatureError),

    /// The recovered signer is not the claimed sender.
    #[error("recovered signer {recovered} does not match claimed sender {claimed}")]
    Mismatch {
        /// The recovered signer.
        recovered: Address,
        /// The claimed sender.
        claimed: Address,
    },
}

/// Parse a recovery parameter into the y-parity.
pub const fn parity(v: u64) -> Result<bool, SignatureError> {
    match v {
        0 | 27 => Ok(false),
        1 | 28 => Ok(true),
        _ => Err(SignatureError::InvalidRecoveryParam(v)),
    }
}

/// Build a [`Signature`] from its components, rejecting zero scalars and
/// high `s` values.
pub fn signature(v: u64, r: U256, s: U256) -> Result<Signature, SignatureError> {
    let parity = parity(v)?;
    if r.is_zero() || s.is_zero() {
        return Err(SignatureError::ZeroScalar);
    }
    if s > SECP256K1N_HALF {
        return Err(SignatureError::HighS);
    }
    Ok(Signature::new(r, s, parity))
}

/// Recover the signer of a prehashed message.
pub fn recover(hash: &B256, v: u64, r: U256, s: U256) -> Result<Address, SignatureError> {
    signature(v, r, s)?.recover_address_from_prehash(hash).map_err(Into::into)
}

/// Check that `signature` over `hash` was produced by `claimed`.
pub fn check(hash: &B256, signature: &Signature, claimed: Address) -> Result<(), SignatureError> {
    let recovered = signature.recover_address_from_prehash(hash)?;
    if recovered != claimed {
        return Err(SignatureError::Mismatch { recovered, claimed });
    }
    Ok(())
}

/// True if the signature over `hash` recovers to `claimed`.
pub fn verify(hash: &B256, v: u64, r: U256, s: U256, claimed: Address) -> bool {
    recover(hash, v, r, s).is_ok_and(|recovered| recovered == claimed)
}
