// Copyright © 2019 Binance
//
// This file is part of Binance. The full Binance copyright notice, including
// terms governing use, modification, and redistribution, is contained in the
// file LICENSE at the root of the source code distribution tree.

use crate::crypto::ecpoint::ECPoint;
use crate::crypto::schnorr::{ComplaintSignature, Signature};
use crate::tss::originator::Originator;

use k256::Scalar;
use std::fmt;

pub use crate::crypto::MemberId;

pub type GroupId = u64;
pub type SigningId = u64;
pub type Address = String;

/// Per-block execution environment handed to every state transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Context {
    pub block_height: u64,
    /// Unix seconds.
    pub block_time: u64,
    pub chain_id: String,
    /// Chain randomness mixed into DKG contexts and signer selection.
    pub rolling_seed: Vec<u8>,
}

impl Context {
    pub fn new(block_height: u64, block_time: u64, chain_id: impl Into<String>, rolling_seed: Vec<u8>) -> Self {
        Self { block_height, block_time, chain_id: chain_id.into(), rolling_seed }
    }

    /// The context of the following block, `block_secs` later.
    pub fn next_block(&self, block_secs: u64) -> Self {
        Self {
            block_height: self.block_height + 1,
            block_time: self.block_time + block_secs,
            chain_id: self.chain_id.clone(),
            rolling_seed: self.rolling_seed.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GroupStatus {
    Round1,
    Round2,
    Round3,
    Active,
    Fallen,
    Expired,
}

impl GroupStatus {
    /// Still running the DKG rounds.
    pub fn is_creating(&self) -> bool {
        matches!(self, GroupStatus::Round1 | GroupStatus::Round2 | GroupStatus::Round3)
    }
}

impl fmt::Display for GroupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GroupStatus::Round1 => "ROUND_1",
            GroupStatus::Round2 => "ROUND_2",
            GroupStatus::Round3 => "ROUND_3",
            GroupStatus::Active => "ACTIVE",
            GroupStatus::Fallen => "FALLEN",
            GroupStatus::Expired => "EXPIRED",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    pub id: GroupId,
    pub size: u64,
    pub threshold: u64,
    /// Set once the group turns Active; never changes afterwards.
    pub pub_key: Option<ECPoint>,
    pub status: GroupStatus,
    /// Binds every DKG artifact to this run.
    pub dkg_context: Vec<u8>,
    pub module_owner: String,
    pub created_height: u64,
    pub last_used_height: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    pub id: MemberId,
    pub group_id: GroupId,
    pub address: Address,
    /// Verification key Yᵢ, known from the end of Round1.
    pub pub_key: Option<ECPoint>,
    pub is_malicious: bool,
    pub is_active: bool,
}

impl Member {
    pub fn verify(&self, address: &str) -> bool {
        self.address == address
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Round2Info {
    pub member_id: MemberId,
    /// One masked share per other member, ordered by member id.
    pub encrypted_secret_shares: Vec<Scalar>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Complaint {
    pub complainant: MemberId,
    pub respondent: MemberId,
    pub key_sym: ECPoint,
    pub signature: ComplaintSignature,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Confirm {
    pub member_id: MemberId,
    pub own_pub_key_sig: Signature,
}

/// A pre-published nonce commitment pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DE {
    pub pub_d: ECPoint,
    pub pub_e: ECPoint,
}

/// Monotonic queue bounds: `head` is the next pair to hand out, `tail` the next free slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DEQueue {
    pub head: u64,
    pub tail: u64,
}

impl DEQueue {
    pub fn len(&self) -> u64 {
        self.tail - self.head
    }

    pub fn is_empty(&self) -> bool {
        self.head >= self.tail
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SigningStatus {
    Waiting,
    Success,
    Fallen,
    Expired,
}

impl fmt::Display for SigningStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SigningStatus::Waiting => "WAITING",
            SigningStatus::Success => "SUCCESS",
            SigningStatus::Fallen => "FALLEN",
            SigningStatus::Expired => "EXPIRED",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signing {
    pub id: SigningId,
    pub current_attempt: u64,
    pub group_id: GroupId,
    pub group_pub_key: ECPoint,
    pub originator: Originator,
    pub message: Vec<u8>,
    pub group_pub_nonce: Option<ECPoint>,
    pub signature: Option<Signature>,
    pub status: SigningStatus,
    pub created_height: u64,
    pub fail_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssignedMember {
    pub member_id: MemberId,
    pub address: Address,
    pub pub_key: ECPoint,
    pub pub_d: ECPoint,
    pub pub_e: ECPoint,
    pub binding_factor: Scalar,
    pub pub_nonce: ECPoint,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SigningAttempt {
    pub signing_id: SigningId,
    pub attempt: u64,
    pub expired_height: u64,
    pub assigned_members: Vec<AssignedMember>,
}

impl SigningAttempt {
    pub fn member_ids(&self) -> Vec<MemberId> {
        self.assigned_members.iter().map(|am| am.member_id).collect()
    }

    pub fn addresses(&self) -> Vec<Address> {
        self.assigned_members.iter().map(|am| am.address.clone()).collect()
    }

    pub fn find(&self, member_id: MemberId) -> Option<&AssignedMember> {
        self.assigned_members.iter().find(|am| am.member_id == member_id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartialSignature {
    pub signing_id: SigningId,
    pub attempt: u64,
    pub member_id: MemberId,
    pub signature: Signature,
}

/// Everything a consumer needs to follow one signing request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SigningResult {
    pub signing: Signing,
    pub current_attempt: Option<SigningAttempt>,
    pub received_partial_signatures: Vec<PartialSignature>,
}
