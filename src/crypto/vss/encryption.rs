// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

//! Share transport between members.
//!
//! Each share travels masked under the ECDH key of the two members' one-time
//! keys: `enc = σ + H(K)` with `K = X_j^{x_i}`. Both one-time keys are fresh
//! per DKG run, so every (sender, receiver) pair gets its own mask.

use super::feldman_vss::{compute_secret_share, VssError};
use crate::common::hash::hash_to_scalar;
use crate::crypto::ecpoint::ECPoint;
use crate::crypto::MemberId;

use k256::Scalar;

/// K = X_j^{x_i}
pub fn compute_key_sym(one_time_priv: &Scalar, other_one_time_pub: &ECPoint) -> Result<ECPoint, VssError> {
    other_one_time_pub.validate_basic()?;
    Ok(other_one_time_pub.scalar_mul(one_time_priv))
}

fn mask(key_sym: &ECPoint) -> Scalar {
    hash_to_scalar("shareMask", &[&key_sym.to_bytes()])
}

pub fn encrypt_share(share: &Scalar, key_sym: &ECPoint) -> Scalar {
    *share + mask(key_sym)
}

pub fn decrypt_share(enc_share: &Scalar, key_sym: &ECPoint) -> Scalar {
    *enc_share - mask(key_sym)
}

/// Position of `receiver`'s share inside `sender`'s list, which is ordered by
/// member id and skips the sender itself.
pub fn find_member_slot(sender: MemberId, receiver: MemberId) -> Result<usize, VssError> {
    if sender == 0 || receiver == 0 {
        return Err(VssError::IndexIsZero);
    }
    if sender == receiver {
        return Err(VssError::InvalidParameters("a member has no share slot for itself".to_string()));
    }
    let slot = if receiver < sender { receiver - 1 } else { receiver - 2 };
    Ok(slot as usize)
}

/// Evaluates the sender's polynomial for every other member and masks each
/// share under the pairwise key. `one_time_pubs[k]` is the key of member `k + 1`.
pub fn compute_encrypted_secret_shares(
    member_id: MemberId,
    one_time_priv: &Scalar,
    one_time_pubs: &[ECPoint],
    coefficients: &[Scalar],
) -> Result<Vec<Scalar>, VssError> {
    if member_id == 0 || member_id as usize > one_time_pubs.len() {
        return Err(VssError::MemberNotInList(member_id));
    }
    if coefficients.is_empty() {
        return Err(VssError::InvalidParameters("coefficients are empty".to_string()));
    }

    let mut enc_shares = Vec::with_capacity(one_time_pubs.len() - 1);
    for (idx, pub_j) in one_time_pubs.iter().enumerate() {
        let receiver = idx as MemberId + 1;
        if receiver == member_id {
            continue;
        }
        let key_sym = compute_key_sym(one_time_priv, pub_j)?;
        let share = compute_secret_share(coefficients, receiver);
        enc_shares.push(encrypt_share(&share, &key_sym));
    }
    Ok(enc_shares)
}

/// Unmasks the shares addressed to `member_id` from every other member's
/// Round2 list. `enc_lists[k]` is the list sent by member `k + 1`; the entry
/// for `member_id` itself is ignored.
pub fn decrypt_received_shares(
    member_id: MemberId,
    one_time_priv: &Scalar,
    one_time_pubs: &[ECPoint],
    enc_lists: &[Vec<Scalar>],
) -> Result<Vec<(MemberId, Scalar)>, VssError> {
    if enc_lists.len() != one_time_pubs.len() {
        return Err(VssError::InvalidLength { expected: one_time_pubs.len(), got: enc_lists.len() });
    }

    let mut shares = Vec::with_capacity(enc_lists.len().saturating_sub(1));
    for (idx, list) in enc_lists.iter().enumerate() {
        let sender = idx as MemberId + 1;
        if sender == member_id {
            continue;
        }
        let slot = find_member_slot(sender, member_id)?;
        let enc = list
            .get(slot)
            .ok_or(VssError::InvalidLength { expected: slot + 1, got: list.len() })?;
        let key_sym = compute_key_sym(one_time_priv, &one_time_pubs[idx])?;
        shares.push((sender, decrypt_share(enc, &key_sym)));
    }
    Ok(shares)
}
