use crate::crypto::ecpoint::PointError;
use crate::crypto::schnorr::SchnorrError;
use crate::crypto::signing::SigningError;
use crate::crypto::vss::VssError;
use crate::tss::types::{GroupId, GroupStatus, MemberId, SigningId, SigningStatus};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("group not found: {0}")]
    GroupNotFound(GroupId),
    #[error("member not found: group {group_id}, member {member_id}")]
    MemberNotFound { group_id: GroupId, member_id: MemberId },
    #[error("member {member_id} is not owned by {address}")]
    MemberNotAuthorized { member_id: MemberId, address: String },
    #[error("address {address} is not a member of group {group_id}")]
    AddressNotMember { group_id: GroupId, address: String },
    #[error("member is already complain or confirm")]
    MemberAlreadyComplainOrConfirm,
    #[error("invalid status: group {group_id} is {status}")]
    InvalidStatus { group_id: GroupId, status: GroupStatus },
    #[error("round 1 info not found: member {0}")]
    Round1InfoNotFound(MemberId),
    #[error("round 2 info not found: member {0}")]
    Round2InfoNotFound(MemberId),
    #[error("coefficients commit length is not correct: expected {expected}, got {got}")]
    InvalidLengthCoefCommits { expected: u64, got: usize },
    #[error("encrypted secret shares length is not correct: expected {expected}, got {got}")]
    InvalidLengthEncryptedSecretShares { expected: u64, got: usize },
    #[error("failed to verify one time sign: {0}")]
    VerifyOneTimeSignatureFailed(String),
    #[error("failed to verify a0 sign: {0}")]
    VerifyA0SignatureFailed(String),
    #[error("share mismatch: {0}")]
    ShareMismatch(String),
    #[error("failed to complain: {0}")]
    InvalidComplaint(String),
    #[error("failed to confirm: {0}")]
    ConfirmFailed(String),
    #[error("threshold value is unexpected: threshold {threshold}, size {size}")]
    InvalidThreshold { threshold: u64, size: u64 },
    #[error("group size is out of bounds: {size} (max {max})")]
    InvalidGroupSize { size: u64, max: u64 },
    #[error("duplicate member address: {0}")]
    DuplicateMember(String),
    #[error("de queue is full: {address} holds {count} (max {max})")]
    DEQueueFull { address: String, count: u64, max: u64 },
    #[error("de not found: {0}")]
    NoDE(String),
    #[error("invalid de: {0}")]
    InvalidDE(String),
    #[error("group is not active: {0}")]
    GroupIsNotActive(GroupId),
    #[error("signing not found: {0}")]
    SigningNotFound(SigningId),
    #[error("signing attempt not found: signing {signing_id}, attempt {attempt}")]
    SigningAttemptNotFound { signing_id: SigningId, attempt: u64 },
    #[error("signing {signing_id} is not waiting: {status}")]
    SigningNotWaiting { signing_id: SigningId, status: SigningStatus },
    #[error("signing expired: signing {signing_id}, attempt {attempt}")]
    SigningAttemptExpired { signing_id: SigningId, attempt: u64 },
    #[error("member is not assigned: {0}")]
    MemberNotAssigned(MemberId),
    #[error("already signed: member {0}")]
    AlreadySigned(MemberId),
    #[error("public nonce not equal to signature r: member {0}")]
    PubNonceNotEqualToSigR(MemberId),
    #[error("failed to verify signing signature: {0}")]
    InvalidPartialSignature(String),
    #[error("failed to combine signatures: {0}")]
    CombineSignaturesFailed(String),
    #[error("insufficient signers: required {required}, available {available}")]
    InsufficientSigners { required: u64, available: u64 },
    #[error("max signing attempt reached: {0}")]
    MaxSigningAttemptReached(u64),
    #[error("invalid originator: {0}")]
    InvalidOriginator(String),
    #[error("invalid params: {0}")]
    InvalidParams(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("internal error: {0}")]
    Internal(String),
    #[error(transparent)]
    Vss(#[from] VssError),
    #[error(transparent)]
    Signing(#[from] SigningError),
    #[error(transparent)]
    Schnorr(#[from] SchnorrError),
    #[error(transparent)]
    Point(#[from] PointError),
}
