//! In-memory state of the coordination core.
//!
//! Every collection is ordered so that iteration, and therefore every derived
//! decision, is identical on all nodes.

use crate::crypto::ecpoint::ECPoint;
use crate::crypto::schnorr::Signature;
use crate::crypto::vss::Round1Info;
use crate::tss::error::{Error, Result};
use crate::tss::types::{
    Address, Complaint, Confirm, DEQueue, Group, GroupId, Member, MemberId, Round2Info, Signing, SigningAttempt,
    SigningId, DE,
};

use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Default)]
pub struct Store {
    pub(crate) group_count: u64,
    pub(crate) groups: BTreeMap<GroupId, Group>,
    pub(crate) members: BTreeMap<(GroupId, MemberId), Member>,

    // interim DKG data, dropped once the group leaves the rounds
    pub(crate) round1_infos: BTreeMap<(GroupId, MemberId), Round1Info>,
    pub(crate) accumulated_commits: BTreeMap<GroupId, Vec<ECPoint>>,
    pub(crate) round2_infos: BTreeMap<(GroupId, MemberId), Round2Info>,
    pub(crate) confirms: BTreeMap<(GroupId, MemberId), Confirm>,
    pub(crate) complaints: BTreeMap<(GroupId, MemberId), Vec<Complaint>>,

    pub(crate) de_queues: BTreeMap<Address, DEQueue>,
    pub(crate) des: BTreeMap<(Address, u64), DE>,

    pub(crate) signing_count: u64,
    pub(crate) signings: BTreeMap<SigningId, Signing>,
    pub(crate) signing_attempts: BTreeMap<(SigningId, u64), SigningAttempt>,
    pub(crate) partial_signatures: BTreeMap<(SigningId, u64, MemberId), Signature>,

    pub(crate) pending_groups: Vec<GroupId>,
    pub(crate) pending_signings: Vec<SigningId>,
    /// (deadline height, group)
    pub(crate) group_deadlines: BTreeSet<(u64, GroupId)>,
    /// (expired height, signing, attempt)
    pub(crate) signing_expirations: BTreeSet<(u64, SigningId, u64)>,
}

impl Store {
    pub fn group(&self, group_id: GroupId) -> Result<&Group> {
        self.groups.get(&group_id).ok_or(Error::GroupNotFound(group_id))
    }

    pub fn group_mut(&mut self, group_id: GroupId) -> Result<&mut Group> {
        self.groups.get_mut(&group_id).ok_or(Error::GroupNotFound(group_id))
    }

    pub fn next_group_id(&mut self) -> GroupId {
        self.group_count += 1;
        self.group_count
    }

    pub fn member(&self, group_id: GroupId, member_id: MemberId) -> Result<&Member> {
        self.members
            .get(&(group_id, member_id))
            .ok_or(Error::MemberNotFound { group_id, member_id })
    }

    pub fn member_mut(&mut self, group_id: GroupId, member_id: MemberId) -> Result<&mut Member> {
        self.members
            .get_mut(&(group_id, member_id))
            .ok_or(Error::MemberNotFound { group_id, member_id })
    }

    /// Members of a group ordered by member id.
    pub fn group_members(&self, group_id: GroupId) -> Vec<Member> {
        self.members
            .range((group_id, MemberId::MIN)..=(group_id, MemberId::MAX))
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn round1_infos(&self, group_id: GroupId) -> Vec<Round1Info> {
        self.round1_infos
            .range((group_id, MemberId::MIN)..=(group_id, MemberId::MAX))
            .map(|(_, info)| info.clone())
            .collect()
    }

    pub fn round1_info(&self, group_id: GroupId, member_id: MemberId) -> Result<&Round1Info> {
        self.round1_infos
            .get(&(group_id, member_id))
            .ok_or(Error::Round1InfoNotFound(member_id))
    }

    pub fn round2_info(&self, group_id: GroupId, member_id: MemberId) -> Result<&Round2Info> {
        self.round2_infos
            .get(&(group_id, member_id))
            .ok_or(Error::Round2InfoNotFound(member_id))
    }

    fn count_in_group<V>(map: &BTreeMap<(GroupId, MemberId), V>, group_id: GroupId) -> u64 {
        map.range((group_id, MemberId::MIN)..=(group_id, MemberId::MAX)).count() as u64
    }

    pub fn round1_info_count(&self, group_id: GroupId) -> u64 {
        Self::count_in_group(&self.round1_infos, group_id)
    }

    pub fn round2_info_count(&self, group_id: GroupId) -> u64 {
        Self::count_in_group(&self.round2_infos, group_id)
    }

    /// Members that either confirmed or complained in Round3.
    pub fn confirm_complain_count(&self, group_id: GroupId) -> u64 {
        Self::count_in_group(&self.confirms, group_id) + Self::count_in_group(&self.complaints, group_id)
    }

    pub fn has_responded_round3(&self, group_id: GroupId, member_id: MemberId) -> bool {
        self.confirms.contains_key(&(group_id, member_id)) || self.complaints.contains_key(&(group_id, member_id))
    }

    fn retain_other_groups<V>(map: &mut BTreeMap<(GroupId, MemberId), V>, group_id: GroupId) {
        map.retain(|(gid, _), _| *gid != group_id);
    }

    pub fn delete_interim_dkg_data(&mut self, group_id: GroupId) {
        Self::retain_other_groups(&mut self.round1_infos, group_id);
        Self::retain_other_groups(&mut self.round2_infos, group_id);
        Self::retain_other_groups(&mut self.confirms, group_id);
        Self::retain_other_groups(&mut self.complaints, group_id);
        self.accumulated_commits.remove(&group_id);
    }

    pub fn add_pending_group(&mut self, group_id: GroupId) {
        if !self.pending_groups.contains(&group_id) {
            self.pending_groups.push(group_id);
        }
    }

    pub fn add_pending_signing(&mut self, signing_id: SigningId) {
        if !self.pending_signings.contains(&signing_id) {
            self.pending_signings.push(signing_id);
        }
    }

    pub fn de_queue(&self, address: &str) -> DEQueue {
        self.de_queues.get(address).copied().unwrap_or_default()
    }

    pub fn signing(&self, signing_id: SigningId) -> Result<&Signing> {
        self.signings.get(&signing_id).ok_or(Error::SigningNotFound(signing_id))
    }

    pub fn signing_mut(&mut self, signing_id: SigningId) -> Result<&mut Signing> {
        self.signings.get_mut(&signing_id).ok_or(Error::SigningNotFound(signing_id))
    }

    pub fn next_signing_id(&mut self) -> SigningId {
        self.signing_count += 1;
        self.signing_count
    }

    pub fn signing_attempt(&self, signing_id: SigningId, attempt: u64) -> Result<&SigningAttempt> {
        self.signing_attempts
            .get(&(signing_id, attempt))
            .ok_or(Error::SigningAttemptNotFound { signing_id, attempt })
    }

    /// Partial signatures of one attempt, ordered by member id.
    pub fn partial_signatures(&self, signing_id: SigningId, attempt: u64) -> Vec<(MemberId, Signature)> {
        self.partial_signatures
            .range((signing_id, attempt, MemberId::MIN)..=(signing_id, attempt, MemberId::MAX))
            .map(|((_, _, mid), sig)| (*mid, *sig))
            .collect()
    }

    pub fn delete_partial_signatures(&mut self, signing_id: SigningId, attempt: u64) {
        self.partial_signatures
            .retain(|(sid, att, _), _| !(*sid == signing_id && *att == attempt));
    }
}
