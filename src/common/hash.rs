// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

use k256::elliptic_curve::ops::Reduce;
use k256::{FieldBytes, Scalar, U256};
use sha2::{Digest, Sha512_256};

/// Domain tag mixed into every protocol hash.
pub const DOMAIN_TAG: &[u8] = b"BAND-TSS-secp256k1-v0";

const HASH_INPUT_DELIMITER: u8 = b'$';

fn prepare_hash_data(inputs: &[&[u8]]) -> Vec<u8> {
    let bz_size: usize = inputs.iter().map(|bz| bz.len()).sum();
    let mut data = Vec::with_capacity(8 + bz_size + inputs.len() * 9);

    // Prefix with the number of inputs (u64 little-endian)
    data.extend_from_slice(&(inputs.len() as u64).to_le_bytes());

    for bz in inputs {
        data.extend_from_slice(bz);
        data.push(HASH_INPUT_DELIMITER);
        data.extend_from_slice(&(bz.len() as u64).to_le_bytes());
    }
    data
}

/// Computes SHA-512/256 of the input byte slices, with safety delimiters and length prefixes.
/// Protected against length extension and concatenation ambiguity.
pub fn sha512_256(inputs: &[&[u8]]) -> [u8; 32] {
    let mut state = Sha512_256::new();
    state.update(prepare_hash_data(inputs));
    state.finalize().into()
}

/// Computes a tagged SHA-512/256 hash. The tag is hashed first and fed twice
/// into the state before the framed inputs.
pub fn sha512_256_tagged(tag: &[u8], inputs: &[&[u8]]) -> [u8; 32] {
    let tag_hash = Sha512_256::digest(tag);

    let mut state = Sha512_256::new();
    state.update(tag_hash);
    state.update(tag_hash);
    state.update(prepare_hash_data(inputs));
    state.finalize().into()
}

/// H_label(m): tagged hash under the protocol domain, with a per-use label as first input.
pub fn hash_labeled(label: &str, inputs: &[&[u8]]) -> [u8; 32] {
    let mut framed: Vec<&[u8]> = Vec::with_capacity(inputs.len() + 1);
    framed.push(label.as_bytes());
    framed.extend_from_slice(inputs);
    sha512_256_tagged(DOMAIN_TAG, &framed)
}

/// Reduces a labeled hash into a secp256k1 scalar.
pub fn hash_to_scalar(label: &str, inputs: &[&[u8]]) -> Scalar {
    let digest = hash_labeled(label, inputs);
    <Scalar as Reduce<U256>>::reduce_bytes(&FieldBytes::from(digest))
}

/// Plain hash of a single byte string, used for field digests inside encodings.
pub fn hash_bytes(data: &[u8]) -> [u8; 32] {
    sha512_256(&[data])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha512_256() {
        let data1 = b"hello";
        let data2 = b"world";

        let hash1 = sha512_256(&[&data1[..], &data2[..]]);
        let hash3 = sha512_256(&[&data2[..], &data1[..]]);

        // Ensure order matters and delimiter prevents simple concatenation collision
        assert_ne!(hash1, hash3);
        let hash_combined = sha512_256(&[&b"helloworld"[..]]);
        assert_ne!(hash1, hash_combined);

        let hash2 = sha512_256(&[&data1[..]]);
        let hash_empty = sha512_256(&[&data1[..], &b""[..]]);
        assert_ne!(hash2, hash_empty);
    }

    #[test]
    fn test_sha512_256_tagged() {
        let tag = b"MY_UNIQUE_TAG";
        let hash1 = sha512_256_tagged(tag, &[&b"a"[..], &b"b"[..]]);
        let hash2 = sha512_256_tagged(tag, &[&b"b"[..], &b"a"[..]]);
        assert_ne!(hash1, hash2);

        let hash3 = sha512_256_tagged(b"ANOTHER_TAG", &[&b"a"[..], &b"b"[..]]);
        assert_ne!(hash1, hash3);
        assert_ne!(hash1, sha512_256(&[&b"a"[..], &b"b"[..]]));
    }

    #[test]
    fn test_hash_to_scalar_is_label_separated() {
        let a = hash_to_scalar("round1A0", &[&b"payload"[..]]);
        let b = hash_to_scalar("round1OneTime", &[&b"payload"[..]]);
        assert_ne!(a, b);
        assert_eq!(a, hash_to_scalar("round1A0", &[&b"payload"[..]]));
    }
}
