// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

use k256::elliptic_curve::Field;
use k256::Scalar;
use rand::{CryptoRng, Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use super::hash::sha512_256_tagged;

const SELECTION_TAG: &[u8] = b"signer-selection";

/// Samples a uniformly random non-zero scalar.
pub fn get_random_scalar<R: CryptoRng + RngCore>(rng: &mut R) -> Scalar {
    loop {
        let candidate = Scalar::random(&mut *rng);
        if !bool::from(candidate.is_zero()) {
            return candidate;
        }
    }
}

/// Builds the deterministic PRNG every node derives for the same inputs.
/// Same seed, nonce and chain id give the same stream on every machine.
pub fn seeded_rng(seed: &[u8], nonce: &[u8], chain_id: &str) -> ChaCha20Rng {
    let digest = sha512_256_tagged(SELECTION_TAG, &[seed, nonce, chain_id.as_bytes()]);
    ChaCha20Rng::from_seed(digest)
}

/// Picks `k` distinct positions out of `0..n` with a partial Fisher-Yates pass.
/// Returns `None` when `k > n`.
pub fn choose_indices<R: Rng>(rng: &mut R, n: usize, k: usize) -> Option<Vec<usize>> {
    if k > n {
        return None;
    }
    let mut pool: Vec<usize> = (0..n).collect();
    for i in 0..k {
        let j = rng.gen_range(i..n);
        pool.swap(i, j);
    }
    pool.truncate(k);
    Some(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;
    use std::collections::HashSet;

    #[test]
    fn test_get_random_scalar() {
        let mut rng = thread_rng();
        let a = get_random_scalar(&mut rng);
        let b = get_random_scalar(&mut rng);
        assert!(!bool::from(a.is_zero()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_seeded_rng_is_deterministic() {
        let mut r1 = seeded_rng(b"seed", b"nonce", "chain");
        let mut r2 = seeded_rng(b"seed", b"nonce", "chain");
        assert_eq!(r1.next_u64(), r2.next_u64());

        let mut r3 = seeded_rng(b"seed", b"nonce2", "chain");
        let mut r4 = seeded_rng(b"seed", b"nonce", "chain");
        assert_ne!(r3.next_u64(), r4.next_u64());
    }

    #[test]
    fn test_choose_indices() {
        let mut rng = seeded_rng(b"seed", b"n", "c");
        let picked = choose_indices(&mut rng, 10, 4).unwrap();
        assert_eq!(picked.len(), 4);
        let set: HashSet<_> = picked.iter().collect();
        assert_eq!(set.len(), 4);
        assert!(picked.iter().all(|i| *i < 10));

        assert!(choose_indices(&mut rng, 3, 4).is_none());
        assert_eq!(choose_indices(&mut rng, 3, 0).unwrap(), Vec::<usize>::new());
    }
}
