// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

// Feldman VSS, based on Paul Feldman, 1987., A practical scheme for non-interactive verifiable secret sharing.
// In Foundations of Computer Science, 1987., 28th Annual Symposium on. IEEE, 427–43

use crate::crypto::ecpoint::{ECPoint, PointError};
use crate::crypto::schnorr::SchnorrError;
use crate::crypto::MemberId;

use k256::Scalar;
use log::warn;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VssError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("duplicate member id found: {0}")]
    DuplicateIndex(MemberId),
    #[error("member id is zero, which is not allowed")]
    IndexIsZero,
    #[error("member {0} is not in the member list")]
    MemberNotInList(MemberId),
    #[error("share verification failed for member {member_id}")]
    ShareMismatch { member_id: MemberId },
    #[error("length mismatch: expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },
    #[error("signature error: {0}")]
    SchnorrError(String),
    #[error("point operation failed: {0}")]
    PointError(String),
}

impl From<PointError> for VssError {
    fn from(err: PointError) -> Self {
        VssError::PointError(err.to_string())
    }
}

impl From<SchnorrError> for VssError {
    fn from(err: SchnorrError) -> Self {
        VssError::SchnorrError(err.to_string())
    }
}

/// Checks member ids for duplicates or zero values.
pub fn check_indexes(indexes: &[MemberId]) -> Result<(), VssError> {
    if indexes.is_empty() {
        return Err(VssError::InvalidParameters("indexes slice cannot be empty".to_string()));
    }
    let mut visited = HashSet::new();
    for v in indexes {
        if *v == 0 {
            return Err(VssError::IndexIsZero);
        }
        if !visited.insert(*v) {
            return Err(VssError::DuplicateIndex(*v));
        }
    }
    Ok(())
}

/// Evaluates f(x) = a₀ + a₁x + ... + aₜ₋₁xᵗ⁻¹ at the member's id, giving σᵢ = f(i).
pub fn compute_secret_share(coefficients: &[Scalar], member_id: MemberId) -> Scalar {
    let x = Scalar::from(member_id);
    coefficients
        .iter()
        .rev()
        .fold(Scalar::ZERO, |acc, a| acc * x + a)
}

/// Computes Π vⱼ^(i^j), the commitment to the share of member `i`.
pub fn compute_secret_share_commit(commits: &[ECPoint], member_id: MemberId) -> ECPoint {
    ECPoint::solve_polynomial(commits, &Scalar::from(member_id))
}

/// Verifies a share σᵢ against the committer's coefficient commits.
/// Checks g^σᵢ = Π vⱼ^(i^j).
pub fn verify_secret_share(
    member_id: MemberId,
    share: &Scalar,
    commits: &[ECPoint],
) -> Result<(), VssError> {
    if commits.is_empty() {
        return Err(VssError::InvalidParameters("coefficient commits are empty".to_string()));
    }
    let lhs = ECPoint::scalar_base_mult(share);
    let rhs = compute_secret_share_commit(commits, member_id);
    if lhs != rhs {
        warn!("secret share for member {} does not match commits", member_id);
        return Err(VssError::ShareMismatch { member_id });
    }
    Ok(())
}

/// Sums every member's coefficient commits position-wise: Σⱼ vⱼₖ for each k.
pub fn sum_commits(all_commits: &[Vec<ECPoint>]) -> Result<Vec<ECPoint>, VssError> {
    let first = all_commits
        .first()
        .ok_or_else(|| VssError::InvalidParameters("no commits to accumulate".to_string()))?;
    let width = first.len();
    let mut acc = vec![ECPoint::identity(); width];
    for commits in all_commits {
        if commits.len() != width {
            return Err(VssError::InvalidLength { expected: width, got: commits.len() });
        }
        for (slot, c) in acc.iter_mut().zip(commits) {
            *slot = *slot + c;
        }
    }
    Ok(acc)
}

/// Y = Σ a₀ commitments of all members.
pub fn compute_group_public_key(a0_commits: &[ECPoint]) -> Result<ECPoint, VssError> {
    let pub_key: ECPoint = a0_commits.iter().sum();
    pub_key.validate_basic()?;
    Ok(pub_key)
}

/// The member's verification key Yᵢ = Σₖ (i^k · Σⱼ vⱼₖ).
pub fn compute_own_public_key(accumulated_commits: &[ECPoint], member_id: MemberId) -> Result<ECPoint, VssError> {
    let pub_key = compute_secret_share_commit(accumulated_commits, member_id);
    pub_key.validate_basic()?;
    Ok(pub_key)
}

/// xᵢ = Σ received shares, including the member's own f(i).
pub fn compute_own_private_key(shares: &[Scalar]) -> Result<Scalar, VssError> {
    if shares.is_empty() {
        return Err(VssError::InvalidParameters("no secret shares to combine".to_string()));
    }
    let key = shares.iter().fold(Scalar::ZERO, |acc, s| acc + s);
    if bool::from(key.is_zero()) {
        return Err(VssError::InvalidParameters("combined private key is zero".to_string()));
    }
    Ok(key)
}

/// Lagrange basis λᵢ(0) = Π_{j≠i} j / (j - i) over the given member set.
pub fn compute_lagrange_coefficient(member_id: MemberId, member_list: &[MemberId]) -> Result<Scalar, VssError> {
    check_indexes(member_list)?;
    if !member_list.contains(&member_id) {
        return Err(VssError::MemberNotInList(member_id));
    }

    let x_i = Scalar::from(member_id);
    let mut num = Scalar::ONE;
    let mut den = Scalar::ONE;
    for &j in member_list.iter().filter(|j| **j != member_id) {
        let x_j = Scalar::from(j);
        num = num * x_j;
        den = den * (x_j - x_i);
    }

    let den_inv = Option::<Scalar>::from(den.invert())
        .ok_or_else(|| VssError::InvalidParameters("lagrange denominator is not invertible".to_string()))?;
    Ok(num * den_inv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::random::get_random_scalar;
    use rand::thread_rng;

    fn random_polynomial(threshold: usize) -> (Vec<Scalar>, Vec<ECPoint>) {
        let mut rng = thread_rng();
        let coeffs: Vec<Scalar> = (0..threshold).map(|_| get_random_scalar(&mut rng)).collect();
        let commits = coeffs.iter().map(ECPoint::scalar_base_mult).collect();
        (coeffs, commits)
    }

    #[test]
    fn test_share_verify_and_reconstruct() {
        let threshold = 3;
        let (coeffs, commits) = random_polynomial(threshold);
        let ids: Vec<MemberId> = (1..=5).collect();
        let shares: Vec<Scalar> = ids.iter().map(|id| compute_secret_share(&coeffs, *id)).collect();

        for (id, share) in ids.iter().zip(&shares) {
            assert!(verify_secret_share(*id, share, &commits).is_ok());
        }

        // any `threshold` shares reconstruct a₀
        for subset in [[1u64, 2, 3], [2, 4, 5], [1, 3, 5]] {
            let secret = subset.iter().fold(Scalar::ZERO, |acc, id| {
                let l = compute_lagrange_coefficient(*id, &subset).unwrap();
                acc + shares[(*id - 1) as usize] * l
            });
            assert_eq!(secret, coeffs[0]);
        }
    }

    #[test]
    fn test_verify_fail_tampered_share() {
        let (coeffs, commits) = random_polynomial(2);
        let share = compute_secret_share(&coeffs, 1) + Scalar::ONE;
        assert!(matches!(
            verify_secret_share(1, &share, &commits),
            Err(VssError::ShareMismatch { member_id: 1 })
        ));
        // a valid share checked under the wrong id fails too
        let share2 = compute_secret_share(&coeffs, 2);
        assert!(verify_secret_share(3, &share2, &commits).is_err());
    }

    #[test]
    fn test_own_keys_match() {
        let threshold = 2;
        let polys: Vec<(Vec<Scalar>, Vec<ECPoint>)> = (0..3).map(|_| random_polynomial(threshold)).collect();
        let all_commits: Vec<Vec<ECPoint>> = polys.iter().map(|(_, c)| c.clone()).collect();
        let acc = sum_commits(&all_commits).unwrap();

        for id in 1..=3u64 {
            let shares: Vec<Scalar> = polys.iter().map(|(c, _)| compute_secret_share(c, id)).collect();
            let priv_key = compute_own_private_key(&shares).unwrap();
            let pub_key = compute_own_public_key(&acc, id).unwrap();
            assert_eq!(ECPoint::scalar_base_mult(&priv_key), pub_key);
        }

        let a0s: Vec<ECPoint> = all_commits.iter().map(|c| c[0]).collect();
        let group_key = compute_group_public_key(&a0s).unwrap();
        assert_eq!(group_key, acc[0]);
    }

    #[test]
    fn test_sum_commits_length_mismatch() {
        let (_, c1) = random_polynomial(2);
        let (_, c2) = random_polynomial(3);
        assert!(matches!(sum_commits(&[c1, c2]), Err(VssError::InvalidLength { .. })));
        assert!(sum_commits(&[]).is_err());
    }

    #[test]
    fn test_check_indexes() {
        assert!(check_indexes(&[1, 2]).is_ok());
        assert!(matches!(check_indexes(&[1, 0]), Err(VssError::IndexIsZero)));
        assert!(matches!(check_indexes(&[1, 2, 1]), Err(VssError::DuplicateIndex(1))));
        assert!(matches!(check_indexes(&[]), Err(VssError::InvalidParameters(_))));
    }

    #[test]
    fn test_lagrange_errors() {
        assert!(matches!(compute_lagrange_coefficient(4, &[1, 2, 3]), Err(VssError::MemberNotInList(4))));
        assert!(matches!(compute_lagrange_coefficient(1, &[1, 1]), Err(VssError::DuplicateIndex(1))));
        assert_eq!(compute_lagrange_coefficient(1, &[1]).unwrap(), Scalar::ONE);
    }
}
