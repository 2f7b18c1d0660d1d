// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

//! Two-base Schnorr proof that a revealed symmetric key was derived honestly.
//!
//! The complainant `i` proves knowledge of `x` with `X_i = g^x` and
//! `K = X_j^x`, i.e. that the key it revealed is the ECDH key it shares with
//! respondent `j`, without revealing `x`:
//!
//! - `A1 = g^k`, `A2 = X_j^k`
//! - `c = H(A1, A2, X_i, X_j, K)`
//! - `z = k + c·x`

use super::signature::{sign, verify, SchnorrError};
use crate::common::hash::hash_to_scalar;
use crate::crypto::ecpoint::{scalar_from_bytes, scalar_to_bytes, ECPoint, COMPRESSED_POINT_SIZE, SCALAR_SIZE};

use k256::Scalar;

pub const COMPLAINT_SIGNATURE_SIZE: usize = 2 * COMPRESSED_POINT_SIZE + SCALAR_SIZE;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComplaintSignature {
    pub a1: ECPoint,
    pub a2: ECPoint,
    pub z: Scalar,
}

fn complaint_challenge(
    a1: &ECPoint,
    a2: &ECPoint,
    one_time_pub_i: &ECPoint,
    one_time_pub_j: &ECPoint,
    key_sym: &ECPoint,
) -> Scalar {
    hash_to_scalar(
        "round3Complain",
        &[
            &a1.to_bytes(),
            &a2.to_bytes(),
            &one_time_pub_i.to_bytes(),
            &one_time_pub_j.to_bytes(),
            &key_sym.to_bytes(),
        ],
    )
}

impl ComplaintSignature {
    /// Builds the proof with nonce `k`. `one_time_priv_i` must open `one_time_pub_i`.
    pub fn new(
        nonce: &Scalar,
        one_time_priv_i: &Scalar,
        one_time_pub_i: &ECPoint,
        one_time_pub_j: &ECPoint,
        key_sym: &ECPoint,
    ) -> Result<Self, SchnorrError> {
        if ECPoint::scalar_base_mult(one_time_priv_i) != *one_time_pub_i {
            return Err(SchnorrError::InvalidParameters(
                "private key does not open the one-time public key".to_string(),
            ));
        }
        let a1 = ECPoint::scalar_base_mult(nonce);
        let a2 = one_time_pub_j.scalar_mul(nonce);
        let challenge = complaint_challenge(&a1, &a2, one_time_pub_i, one_time_pub_j, key_sym);
        let sig = sign(one_time_priv_i, &challenge, nonce, None, None)?;
        Ok(Self { a1, a2, z: sig.s })
    }

    /// Checks both `g^z == A1 + X_i^c` and `X_j^z == A2 + K^c`.
    pub fn verify(
        &self,
        one_time_pub_i: &ECPoint,
        one_time_pub_j: &ECPoint,
        key_sym: &ECPoint,
    ) -> Result<(), SchnorrError> {
        let challenge = complaint_challenge(&self.a1, &self.a2, one_time_pub_i, one_time_pub_j, key_sym);
        verify(&self.a1, &self.z, &challenge, one_time_pub_i, None, None)?;
        verify(&self.a2, &self.z, &challenge, key_sym, Some(one_time_pub_j), None)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bz = self.a1.to_bytes();
        bz.extend_from_slice(&self.a2.to_bytes());
        bz.extend_from_slice(&scalar_to_bytes(&self.z));
        bz
    }

    pub fn from_bytes(bz: &[u8]) -> Result<Self, SchnorrError> {
        if bz.len() != COMPLAINT_SIGNATURE_SIZE {
            return Err(SchnorrError::InvalidParameters(format!(
                "malformed complaint signature: expected {} bytes, got {}",
                COMPLAINT_SIGNATURE_SIZE,
                bz.len()
            )));
        }
        let a1 = ECPoint::from_bytes(&bz[..COMPRESSED_POINT_SIZE])?;
        let a2 = ECPoint::from_bytes(&bz[COMPRESSED_POINT_SIZE..2 * COMPRESSED_POINT_SIZE])?;
        let z = scalar_from_bytes(&bz[2 * COMPRESSED_POINT_SIZE..])?;
        Ok(Self { a1, a2, z })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::random::get_random_scalar;
    use rand::thread_rng;

    #[test]
    fn test_complaint_signature() {
        let mut rng = thread_rng();
        let x_i = get_random_scalar(&mut rng);
        let x_j = get_random_scalar(&mut rng);
        let pub_i = ECPoint::scalar_base_mult(&x_i);
        let pub_j = ECPoint::scalar_base_mult(&x_j);
        let key_sym = pub_j.scalar_mul(&x_i);

        let nonce = get_random_scalar(&mut rng);
        let sig = ComplaintSignature::new(&nonce, &x_i, &pub_i, &pub_j, &key_sym).unwrap();
        assert!(sig.verify(&pub_i, &pub_j, &key_sym).is_ok());

        let parsed = ComplaintSignature::from_bytes(&sig.to_bytes()).unwrap();
        assert_eq!(parsed, sig);
    }

    #[test]
    fn test_complaint_signature_wrong_key_sym() {
        let mut rng = thread_rng();
        let x_i = get_random_scalar(&mut rng);
        let pub_i = ECPoint::scalar_base_mult(&x_i);
        let pub_j = ECPoint::scalar_base_mult(&get_random_scalar(&mut rng));

        // a key that is not X_j^x_i cannot be proven
        let fake_key = ECPoint::scalar_base_mult(&get_random_scalar(&mut rng));
        let nonce = get_random_scalar(&mut rng);
        let sig = ComplaintSignature::new(&nonce, &x_i, &pub_i, &pub_j, &fake_key).unwrap();
        assert!(matches!(
            sig.verify(&pub_i, &pub_j, &fake_key),
            Err(SchnorrError::VerificationFailed)
        ));
    }

    #[test]
    fn test_complaint_signature_wrong_priv() {
        let mut rng = thread_rng();
        let pub_i = ECPoint::scalar_base_mult(&get_random_scalar(&mut rng));
        let pub_j = ECPoint::scalar_base_mult(&get_random_scalar(&mut rng));
        let other = get_random_scalar(&mut rng);
        let nonce = get_random_scalar(&mut rng);
        assert!(ComplaintSignature::new(&nonce, &other, &pub_i, &pub_j, &pub_j).is_err());
    }
}
