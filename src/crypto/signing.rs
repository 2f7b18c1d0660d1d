// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

//! Two-nonce threshold Schnorr signing (FROST-style).
//!
//! Each assigned member `i` holds a pre-published pair `(D_i, E_i)`. For a
//! message `m` and the sorted commitment list `B`:
//!
//! - `ρᵢ = H(i, H(m), H(B), Y)`
//! - `Rᵢ = Dᵢ + ρᵢ·Eᵢ`, `R = Σ Rᵢ`
//! - `c = H(R, Y, H(m))`
//! - `zᵢ = dᵢ + ρᵢ·eᵢ + λᵢ·c·xᵢ`
//!
//! and the group signature is `(R, Σ zᵢ)`.

use crate::common::hash::{hash_labeled, hash_to_scalar};
use crate::crypto::ecpoint::{ECPoint, PointError};
use crate::crypto::schnorr::{self, SchnorrError, Signature};
use crate::crypto::MemberId;

use k256::Scalar;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SigningError {
    #[error("length mismatch: {0}")]
    InvalidLength(String),
    #[error("member ids must be strictly increasing: {prev} >= {next}")]
    InvalidOrder { prev: MemberId, next: MemberId },
    #[error("no signatures to combine")]
    NoSignatures,
    #[error("signature error: {0}")]
    SchnorrError(String),
    #[error("point operation failed: {0}")]
    PointError(String),
}

impl From<SchnorrError> for SigningError {
    fn from(err: SchnorrError) -> Self {
        SigningError::SchnorrError(err.to_string())
    }
}

impl From<PointError> for SigningError {
    fn from(err: PointError) -> Self {
        SigningError::PointError(err.to_string())
    }
}

/// Serializes `mid || D || E` for every assigned member, in increasing id order.
pub fn compute_commitment(mids: &[MemberId], pub_ds: &[ECPoint], pub_es: &[ECPoint]) -> Result<Vec<u8>, SigningError> {
    if mids.len() != pub_ds.len() || mids.len() != pub_es.len() {
        return Err(SigningError::InvalidLength(format!(
            "mids={}, pubDs={}, pubEs={}",
            mids.len(),
            pub_ds.len(),
            pub_es.len()
        )));
    }

    let mut commitment = Vec::with_capacity(mids.len() * 74);
    let mut prev: MemberId = 0;
    for ((mid, d), e) in mids.iter().zip(pub_ds).zip(pub_es) {
        if prev >= *mid {
            return Err(SigningError::InvalidOrder { prev, next: *mid });
        }
        commitment.extend_from_slice(&mid.to_be_bytes());
        commitment.extend_from_slice(&d.to_bytes());
        commitment.extend_from_slice(&e.to_bytes());
        prev = *mid;
    }
    Ok(commitment)
}

/// ρᵢ, unique per (member, message, commitment list, group key).
pub fn compute_own_binding_factor(
    member_id: MemberId,
    message: &[u8],
    commitment: &[u8],
    group_pub_key: &ECPoint,
) -> Scalar {
    let msg_hash = hash_labeled("signMsg", &[message]);
    let commitment_hash = hash_labeled("signCommitment", &[commitment]);
    hash_to_scalar(
        "bindingFactor",
        &[&member_id.to_be_bytes(), &msg_hash, &commitment_hash, &group_pub_key.to_bytes()],
    )
}

/// Rᵢ = Dᵢ + ρᵢ·Eᵢ
pub fn compute_own_pub_nonce(pub_d: &ECPoint, pub_e: &ECPoint, binding_factor: &Scalar) -> ECPoint {
    *pub_d + pub_e.scalar_mul(binding_factor)
}

/// kᵢ = dᵢ + ρᵢ·eᵢ
pub fn compute_own_priv_nonce(priv_d: &Scalar, priv_e: &Scalar, binding_factor: &Scalar) -> Scalar {
    *priv_d + *priv_e * binding_factor
}

/// R = Σ Rᵢ
pub fn compute_group_pub_nonce(own_pub_nonces: &[ECPoint]) -> Result<ECPoint, SigningError> {
    let r: ECPoint = own_pub_nonces.iter().sum();
    r.validate_basic()?;
    Ok(r)
}

/// c = H(R, Y, H(m))
pub fn compute_challenge(group_pub_nonce: &ECPoint, group_pub_key: &ECPoint, message: &[u8]) -> Scalar {
    let msg_hash = hash_labeled("signMsg", &[message]);
    hash_to_scalar("challenge", &[&group_pub_nonce.to_bytes(), &group_pub_key.to_bytes(), &msg_hash])
}

/// Member-side partial signature `(Rᵢ, zᵢ)`.
pub fn sign_signing(
    group_pub_nonce: &ECPoint,
    group_pub_key: &ECPoint,
    message: &[u8],
    lagrange: &Scalar,
    own_priv_nonce: &Scalar,
    own_priv_key: &Scalar,
) -> Result<Signature, SigningError> {
    let challenge = compute_challenge(group_pub_nonce, group_pub_key, message);
    Ok(schnorr::sign(own_priv_key, &challenge, own_priv_nonce, None, Some(lagrange))?)
}

/// Checks g^zᵢ == Rᵢ + Yᵢ^(λᵢ·c).
pub fn verify_signing_signature(
    group_pub_nonce: &ECPoint,
    group_pub_key: &ECPoint,
    message: &[u8],
    lagrange: &Scalar,
    signature: &Signature,
    own_pub_key: &ECPoint,
) -> Result<(), SigningError> {
    let challenge = compute_challenge(group_pub_nonce, group_pub_key, message);
    Ok(schnorr::verify(&signature.r, &signature.s, &challenge, own_pub_key, None, Some(lagrange))?)
}

/// (Σ Rᵢ, Σ zᵢ)
pub fn combine_signatures(signatures: &[Signature]) -> Result<Signature, SigningError> {
    if signatures.is_empty() {
        return Err(SigningError::NoSignatures);
    }
    let r: ECPoint = signatures.iter().map(|s| s.r).sum();
    let s = signatures.iter().fold(Scalar::ZERO, |acc, sig| acc + sig.s);
    Ok(Signature::new(r, s))
}

/// Verifies a final group signature against the group public key.
pub fn verify_group_signing_signature(
    group_pub_key: &ECPoint,
    message: &[u8],
    signature: &Signature,
) -> Result<(), SigningError> {
    let challenge = compute_challenge(&signature.r, group_pub_key, message);
    Ok(schnorr::verify(&signature.r, &signature.s, &challenge, group_pub_key, None, None)?)
}
