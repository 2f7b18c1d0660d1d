use crate::crypto::ecpoint::ECPoint;
use crate::tss::{Address, GroupId, SigningId};

use std::fmt;

/// Membership of an address in a group the module runs on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    pub address: Address,
    pub group_id: GroupId,
    pub is_active: bool,
    /// Block time of the last activity change.
    pub since: u64,
}

/// The group every module-level signing request goes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CurrentGroup {
    pub group_id: GroupId,
    pub active_time: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransitionStatus {
    CreatingGroup,
    WaitingSign,
    WaitingExecution,
    Success,
    Fallen,
}

impl fmt::Display for TransitionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransitionStatus::CreatingGroup => "CREATING_GROUP",
            TransitionStatus::WaitingSign => "WAITING_SIGN",
            TransitionStatus::WaitingExecution => "WAITING_EXECUTION",
            TransitionStatus::Success => "SUCCESS",
            TransitionStatus::Fallen => "FALLEN",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupTransition {
    pub id: u64,
    /// The attestation signed by the current group.
    pub signing_id: Option<SigningId>,
    pub current_group_id: Option<GroupId>,
    pub current_group_pub_key: Option<ECPoint>,
    pub incoming_group_id: GroupId,
    pub incoming_group_pub_key: Option<ECPoint>,
    pub status: TransitionStatus,
    pub exec_time: u64,
    pub is_force: bool,
}
