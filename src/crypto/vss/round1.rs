// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

use super::feldman_vss::VssError;
use crate::common::hash::hash_to_scalar;
use crate::common::random::get_random_scalar;
use crate::crypto::ecpoint::ECPoint;
use crate::crypto::schnorr::{self, Signature};
use crate::crypto::MemberId;

use k256::Scalar;
use rand::{CryptoRng, RngCore};

/// Public part of a member's Round1 contribution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Round1Info {
    pub member_id: MemberId,
    /// g^aₖ for k in 0..threshold
    pub coefficient_commits: Vec<ECPoint>,
    pub one_time_pub_key: ECPoint,
    pub a0_signature: Signature,
    pub one_time_signature: Signature,
}

/// Round1 contribution together with the secrets the member keeps locally.
#[derive(Clone)]
pub struct Round1Output {
    pub info: Round1Info,
    pub one_time_priv_key: Scalar,
    pub coefficients: Vec<Scalar>,
}

impl std::fmt::Debug for Round1Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Round1Output").field("info", &self.info).finish_non_exhaustive()
    }
}

fn round1_challenge(label: &str, pub_nonce: &ECPoint, member_id: MemberId, dkg_context: &[u8], pub_key: &ECPoint) -> Scalar {
    hash_to_scalar(
        label,
        &[&pub_nonce.to_bytes(), &member_id.to_be_bytes(), dkg_context, &pub_key.to_bytes()],
    )
}

fn sign_bound<R: CryptoRng + RngCore>(
    label: &str,
    member_id: MemberId,
    dkg_context: &[u8],
    pub_key: &ECPoint,
    priv_key: &Scalar,
    rng: &mut R,
) -> Result<Signature, VssError> {
    let nonce = get_random_scalar(rng);
    let pub_nonce = ECPoint::scalar_base_mult(&nonce);
    let challenge = round1_challenge(label, &pub_nonce, member_id, dkg_context, pub_key);
    Ok(schnorr::sign(priv_key, &challenge, &nonce, None, None)?)
}

fn verify_bound(
    label: &str,
    member_id: MemberId,
    dkg_context: &[u8],
    signature: &Signature,
    pub_key: &ECPoint,
) -> Result<(), VssError> {
    let challenge = round1_challenge(label, &signature.r, member_id, dkg_context, pub_key);
    Ok(schnorr::verify(&signature.r, &signature.s, &challenge, pub_key, None, None)?)
}

/// Proof of knowledge of a₀, bound to this member and this DKG run.
pub fn sign_a0<R: CryptoRng + RngCore>(
    member_id: MemberId,
    dkg_context: &[u8],
    a0_pub: &ECPoint,
    a0_priv: &Scalar,
    rng: &mut R,
) -> Result<Signature, VssError> {
    sign_bound("round1A0", member_id, dkg_context, a0_pub, a0_priv, rng)
}

pub fn verify_a0_signature(
    member_id: MemberId,
    dkg_context: &[u8],
    signature: &Signature,
    a0_pub: &ECPoint,
) -> Result<(), VssError> {
    verify_bound("round1A0", member_id, dkg_context, signature, a0_pub)
}

/// Proof of knowledge of the one-time DH key, bound to this member and this DKG run.
pub fn sign_one_time<R: CryptoRng + RngCore>(
    member_id: MemberId,
    dkg_context: &[u8],
    one_time_pub: &ECPoint,
    one_time_priv: &Scalar,
    rng: &mut R,
) -> Result<Signature, VssError> {
    sign_bound("round1OneTime", member_id, dkg_context, one_time_pub, one_time_priv, rng)
}

pub fn verify_one_time_signature(
    member_id: MemberId,
    dkg_context: &[u8],
    signature: &Signature,
    one_time_pub: &ECPoint,
) -> Result<(), VssError> {
    verify_bound("round1OneTime", member_id, dkg_context, signature, one_time_pub)
}

/// Samples `threshold` coefficients and a one-time keypair, commits to the
/// coefficients and signs a₀ and the one-time key under `dkg_context`.
pub fn generate_round1_info<R: CryptoRng + RngCore>(
    member_id: MemberId,
    threshold: u64,
    dkg_context: &[u8],
    rng: &mut R,
) -> Result<Round1Output, VssError> {
    if threshold == 0 {
        return Err(VssError::InvalidParameters("threshold cannot be zero".to_string()));
    }
    if member_id == 0 {
        return Err(VssError::IndexIsZero);
    }

    let coefficients: Vec<Scalar> = (0..threshold).map(|_| get_random_scalar(rng)).collect();
    let coefficient_commits: Vec<ECPoint> = coefficients.iter().map(ECPoint::scalar_base_mult).collect();

    let one_time_priv_key = get_random_scalar(rng);
    let one_time_pub_key = ECPoint::scalar_base_mult(&one_time_priv_key);

    let a0_signature = sign_a0(member_id, dkg_context, &coefficient_commits[0], &coefficients[0], rng)?;
    let one_time_signature = sign_one_time(member_id, dkg_context, &one_time_pub_key, &one_time_priv_key, rng)?;

    Ok(Round1Output {
        info: Round1Info {
            member_id,
            coefficient_commits,
            one_time_pub_key,
            a0_signature,
            one_time_signature,
        },
        one_time_priv_key,
        coefficients,
    })
}
