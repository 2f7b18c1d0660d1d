// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

use crate::crypto::ecpoint::{
    scalar_from_bytes, scalar_to_bytes, ECPoint, PointError, COMPRESSED_POINT_SIZE, SCALAR_SIZE,
};

use k256::Scalar;
use log::debug;
use thiserror::Error;

/// Length of an encoded signature: compressed R followed by s.
pub const SIGNATURE_SIZE: usize = COMPRESSED_POINT_SIZE + SCALAR_SIZE;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchnorrError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("point operation failed: {0}")]
    PointError(String),
    #[error("signature verification failed")]
    VerificationFailed,
}

impl From<PointError> for SchnorrError {
    fn from(err: PointError) -> Self {
        SchnorrError::PointError(err.to_string())
    }
}

/// Schnorr signature `(R, s)` with `R = g^k`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature {
    pub r: ECPoint,
    pub s: Scalar,
}

impl Signature {
    pub fn new(r: ECPoint, s: Scalar) -> Self {
        Self { r, s }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bz = self.r.to_bytes();
        bz.extend_from_slice(&scalar_to_bytes(&self.s));
        bz
    }

    pub fn from_bytes(bz: &[u8]) -> Result<Self, SchnorrError> {
        if bz.len() != SIGNATURE_SIZE {
            return Err(SchnorrError::InvalidParameters(format!(
                "malformed signature: expected {} bytes, got {}",
                SIGNATURE_SIZE,
                bz.len()
            )));
        }
        let r = ECPoint::from_bytes(&bz[..COMPRESSED_POINT_SIZE])?;
        let s = scalar_from_bytes(&bz[COMPRESSED_POINT_SIZE..])?;
        Ok(Self { r, s })
    }
}

/// Produces `(R, s)` where `R = G^k` and `s = k + e·λ·x`.
///
/// `generator` defaults to the curve base point. `lagrange` weights the key
/// share when signing as one member of a threshold group.
pub fn sign(
    priv_key: &Scalar,
    challenge: &Scalar,
    nonce: &Scalar,
    generator: Option<&ECPoint>,
    lagrange: Option<&Scalar>,
) -> Result<Signature, SchnorrError> {
    if bool::from(priv_key.is_zero()) {
        return Err(SchnorrError::InvalidParameters("private key is zero".to_string()));
    }
    if bool::from(nonce.is_zero()) {
        return Err(SchnorrError::InvalidParameters("nonce is zero".to_string()));
    }

    let r = match generator {
        Some(g) => g.scalar_mul(nonce),
        None => ECPoint::scalar_base_mult(nonce),
    };

    let mut weighted = *challenge * priv_key;
    if let Some(l) = lagrange {
        weighted = weighted * l;
    }

    Ok(Signature { r, s: *nonce + weighted })
}

/// Checks `G^s == R + Y^(e·λ)`.
pub fn verify(
    sig_r: &ECPoint,
    sig_s: &Scalar,
    challenge: &Scalar,
    pub_key: &ECPoint,
    generator: Option<&ECPoint>,
    lagrange: Option<&Scalar>,
) -> Result<(), SchnorrError> {
    pub_key.validate_basic()?;
    sig_r.validate_basic()?;

    let lhs = match generator {
        Some(g) => g.scalar_mul(sig_s),
        None => ECPoint::scalar_base_mult(sig_s),
    };

    let mut e = *challenge;
    if let Some(l) = lagrange {
        e = e * l;
    }
    let rhs = *sig_r + pub_key.scalar_mul(&e);

    if lhs != rhs {
        debug!("schnorr verify: G^s != R + Y^e");
        return Err(SchnorrError::VerificationFailed);
    }
    Ok(())
}
