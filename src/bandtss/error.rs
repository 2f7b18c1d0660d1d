use crate::tss::{Address, GroupId};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("group transition is in progress")]
    TransitionInProgress,
    #[error("group transition not found")]
    TransitionNotFound,
    #[error("invalid exec time {exec_time}: must be after {now} and before {max}")]
    InvalidExecTime { exec_time: u64, now: u64, max: u64 },
    #[error("invalid incoming group: {0}")]
    InvalidIncomingGroup(String),
    #[error("no current group")]
    NoCurrentGroup,
    #[error("member not found: {address} in group {group_id}")]
    MemberNotFound { address: Address, group_id: GroupId },
    #[error("member already exists: {address} in group {group_id}")]
    MemberAlreadyExists { address: Address, group_id: GroupId },
    #[error("member is already active: {0}")]
    MemberAlreadyActive(Address),
    #[error("too soon to activate {address}: allowed from {until}")]
    TooSoonToActivate { address: Address, until: u64 },
    #[error("invalid params: {0}")]
    InvalidParams(String),
    #[error(transparent)]
    Tss(#[from] crate::tss::Error),
}
