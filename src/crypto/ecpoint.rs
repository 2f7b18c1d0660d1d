// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

use k256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use k256::elliptic_curve::PrimeField;
use k256::{AffinePoint, EncodedPoint, FieldBytes, ProjectivePoint, Scalar};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul};
use thiserror::Error;

/// Length of a SEC1 compressed secp256k1 point.
pub const COMPRESSED_POINT_SIZE: usize = 33;
/// Length of a big-endian encoded scalar.
pub const SCALAR_SIZE: usize = 32;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PointError {
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),
    #[error("point is not on curve")]
    NotOnCurve,
    #[error("point is the identity element")]
    Identity,
    #[error("scalar is not canonical (>= group order)")]
    ScalarOverflow,
}

/// A secp256k1 group element, kept in projective form for cheap arithmetic.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ECPoint(ProjectivePoint);

impl ECPoint {
    pub fn generator() -> Self {
        ECPoint(ProjectivePoint::GENERATOR)
    }

    pub fn identity() -> Self {
        ECPoint(ProjectivePoint::IDENTITY)
    }

    /// g^k
    pub fn scalar_base_mult(k: &Scalar) -> Self {
        ECPoint(ProjectivePoint::GENERATOR * k)
    }

    /// self^k
    pub fn scalar_mul(&self, k: &Scalar) -> Self {
        ECPoint(self.0 * k)
    }

    pub fn is_identity(&self) -> bool {
        self.0 == ProjectivePoint::IDENTITY
    }

    /// Rejects the identity, which is never a valid key, nonce or commitment.
    pub fn validate_basic(&self) -> Result<(), PointError> {
        if self.is_identity() {
            return Err(PointError::Identity);
        }
        Ok(())
    }

    pub fn as_projective(&self) -> &ProjectivePoint {
        &self.0
    }

    /// SEC1 compressed encoding. The identity encodes as a single zero byte.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_affine().to_encoded_point(true).as_bytes().to_vec()
    }

    /// Parses a SEC1 compressed point, rejecting off-curve and identity encodings.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PointError> {
        if bytes.len() != COMPRESSED_POINT_SIZE {
            return Err(PointError::InvalidEncoding(format!(
                "expected {} bytes, got {}",
                COMPRESSED_POINT_SIZE,
                bytes.len()
            )));
        }
        let encoded =
            EncodedPoint::from_bytes(bytes).map_err(|e| PointError::InvalidEncoding(e.to_string()))?;
        let affine: Option<AffinePoint> = AffinePoint::from_encoded_point(&encoded).into();
        let point = ECPoint(ProjectivePoint::from(affine.ok_or(PointError::NotOnCurve)?));
        point.validate_basic()?;
        Ok(point)
    }

    /// Evaluates Σ coeffs_i * x^i, the point polynomial used for share commitments.
    pub fn solve_polynomial(coeffs: &[ECPoint], x: &Scalar) -> ECPoint {
        // Horner's rule from the highest degree down
        coeffs
            .iter()
            .rev()
            .fold(ECPoint::identity(), |acc, c| ECPoint(acc.0 * x + c.0))
    }
}

impl From<ProjectivePoint> for ECPoint {
    fn from(p: ProjectivePoint) -> Self {
        ECPoint(p)
    }
}

impl Add for ECPoint {
    type Output = ECPoint;

    fn add(self, rhs: ECPoint) -> ECPoint {
        ECPoint(self.0 + rhs.0)
    }
}

impl<'a> Add<&'a ECPoint> for ECPoint {
    type Output = ECPoint;

    fn add(self, rhs: &'a ECPoint) -> ECPoint {
        ECPoint(self.0 + rhs.0)
    }
}

impl Mul<&Scalar> for &ECPoint {
    type Output = ECPoint;

    fn mul(self, rhs: &Scalar) -> ECPoint {
        self.scalar_mul(rhs)
    }
}

impl Sum for ECPoint {
    fn sum<I: Iterator<Item = ECPoint>>(iter: I) -> Self {
        iter.fold(ECPoint::identity(), |acc, p| acc + p)
    }
}

impl<'a> Sum<&'a ECPoint> for ECPoint {
    fn sum<I: Iterator<Item = &'a ECPoint>>(iter: I) -> Self {
        iter.fold(ECPoint::identity(), |acc, p| acc + p)
    }
}

impl fmt::Debug for ECPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ECPoint({})", hex::encode(self.to_bytes()))
    }
}

impl fmt::Display for ECPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.to_bytes()))
    }
}

/// Big-endian encoding of a scalar.
pub fn scalar_to_bytes(s: &Scalar) -> [u8; SCALAR_SIZE] {
    s.to_bytes().into()
}

/// Parses a canonical big-endian scalar.
pub fn scalar_from_bytes(bytes: &[u8]) -> Result<Scalar, PointError> {
    let repr: [u8; SCALAR_SIZE] = bytes.try_into().map_err(|_| {
        PointError::InvalidEncoding(format!("expected {} scalar bytes, got {}", SCALAR_SIZE, bytes.len()))
    })?;
    let repr = FieldBytes::from(repr);
    Option::<Scalar>::from(Scalar::from_repr(repr)).ok_or(PointError::ScalarOverflow)
}
