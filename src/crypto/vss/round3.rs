// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

use super::encryption::{compute_key_sym, decrypt_share};
use super::feldman_vss::{verify_secret_share, VssError};
use crate::common::hash::hash_to_scalar;
use crate::common::random::get_random_scalar;
use crate::crypto::ecpoint::ECPoint;
use crate::crypto::schnorr::{self, ComplaintSignature, Signature};
use crate::crypto::MemberId;

use k256::Scalar;
use rand::{CryptoRng, RngCore};

fn own_pub_key_challenge(pub_nonce: &ECPoint, member_id: MemberId, dkg_context: &[u8], own_pub: &ECPoint) -> Scalar {
    hash_to_scalar(
        "round3OwnPubKey",
        &[&pub_nonce.to_bytes(), &member_id.to_be_bytes(), dkg_context, &own_pub.to_bytes()],
    )
}

/// Signs the member's verification key with its combined private key, proving
/// the key was derived from the shares it received.
pub fn sign_own_pub_key<R: CryptoRng + RngCore>(
    member_id: MemberId,
    dkg_context: &[u8],
    own_pub: &ECPoint,
    own_priv: &Scalar,
    rng: &mut R,
) -> Result<Signature, VssError> {
    let nonce = get_random_scalar(rng);
    let pub_nonce = ECPoint::scalar_base_mult(&nonce);
    let challenge = own_pub_key_challenge(&pub_nonce, member_id, dkg_context, own_pub);
    Ok(schnorr::sign(own_priv, &challenge, &nonce, None, None)?)
}

pub fn verify_own_pub_key_signature(
    member_id: MemberId,
    dkg_context: &[u8],
    signature: &Signature,
    own_pub: &ECPoint,
) -> Result<(), VssError> {
    let challenge = own_pub_key_challenge(&signature.r, member_id, dkg_context, own_pub);
    Ok(schnorr::verify(&signature.r, &signature.s, &challenge, own_pub, None, None)?)
}

/// Reveals the pairwise key with respondent `j` and proves it honest.
pub fn sign_complaint<R: CryptoRng + RngCore>(
    one_time_pub_i: &ECPoint,
    one_time_pub_j: &ECPoint,
    one_time_priv_i: &Scalar,
    rng: &mut R,
) -> Result<(ComplaintSignature, ECPoint), VssError> {
    let key_sym = compute_key_sym(one_time_priv_i, one_time_pub_j)?;
    let nonce = get_random_scalar(rng);
    let sig = ComplaintSignature::new(&nonce, one_time_priv_i, one_time_pub_i, one_time_pub_j, &key_sym)?;
    Ok((sig, key_sym))
}

/// Verifies that a complaint is justified: the revealed key is proven, and the
/// share it unmasks fails verification against the respondent's commits.
///
/// Returns `Ok(())` when the respondent misbehaved. A share that verifies
/// means the complaint is false and is returned as `Err(InvalidParameters)`.
pub fn verify_complaint(
    one_time_pub_i: &ECPoint,
    one_time_pub_j: &ECPoint,
    key_sym: &ECPoint,
    signature: &ComplaintSignature,
    enc_share: &Scalar,
    complainant: MemberId,
    respondent_commits: &[ECPoint],
) -> Result<(), VssError> {
    signature.verify(one_time_pub_i, one_time_pub_j, key_sym)?;

    let share = decrypt_share(enc_share, key_sym);
    match verify_secret_share(complainant, &share, respondent_commits) {
        Ok(()) => Err(VssError::InvalidParameters("encrypted secret share is correct".to_string())),
        Err(VssError::ShareMismatch { .. }) => Ok(()),
        Err(e) => Err(e),
    }
}
