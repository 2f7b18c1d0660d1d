//! Distributed key generation and threshold Schnorr signing over secp256k1,
//! coordinated as a block-driven state machine.
//!
//! - [`crypto`] holds the primitives: Feldman VSS, share encryption, Schnorr
//!   proofs and the FROST-style signing math.
//! - [`tss`] runs groups through their DKG rounds, keeps the members' nonce
//!   queues and drives signing requests to an aggregate signature.
//! - [`bandtss`] tracks the group currently signing for the module and
//!   replaces it under an attestation from the outgoing group.

pub mod bandtss;
pub mod common;
pub mod crypto;
pub mod tss;
