//! Member submissions for the three DKG rounds.

use crate::crypto::schnorr::Signature;
use crate::crypto::vss::encryption::find_member_slot;
use crate::crypto::vss::round1::{verify_a0_signature, verify_one_time_signature};
use crate::crypto::vss::round3::{verify_complaint, verify_own_pub_key_signature};
use crate::crypto::vss::Round1Info;
use crate::tss::error::{Error, Result};
use crate::tss::keeper::Keeper;
use crate::tss::types::{Complaint, Confirm, Context, Group, GroupId, GroupStatus, Member, MemberId, Round2Info};

use log::{debug, warn};
use std::collections::BTreeSet;

impl Keeper {
    fn group_in_status(&self, group_id: GroupId, expected: GroupStatus) -> Result<Group> {
        let group = self.store.group(group_id)?;
        if group.status != expected {
            return Err(Error::InvalidStatus { group_id, status: group.status });
        }
        Ok(group.clone())
    }

    fn authorized_member(&self, group_id: GroupId, member_id: MemberId, address: &str) -> Result<Member> {
        let member = self.store.member(group_id, member_id)?;
        if !member.verify(address) {
            return Err(Error::MemberNotAuthorized { member_id, address: address.to_string() });
        }
        Ok(member.clone())
    }

    pub fn submit_round1(&mut self, ctx: &Context, group_id: GroupId, address: &str, info: Round1Info) -> Result<()> {
        let group = self.group_in_status(group_id, GroupStatus::Round1)?;
        let member_id = info.member_id;
        self.authorized_member(group_id, member_id, address)?;

        if info.coefficient_commits.len() as u64 != group.threshold {
            return Err(Error::InvalidLengthCoefCommits {
                expected: group.threshold,
                got: info.coefficient_commits.len(),
            });
        }
        verify_one_time_signature(member_id, &group.dkg_context, &info.one_time_signature, &info.one_time_pub_key)
            .map_err(|e| Error::VerifyOneTimeSignatureFailed(e.to_string()))?;
        verify_a0_signature(member_id, &group.dkg_context, &info.a0_signature, &info.coefficient_commits[0])
            .map_err(|e| Error::VerifyA0SignatureFailed(e.to_string()))?;

        self.store.round1_infos.insert((group_id, member_id), info);
        debug!("group {} received round1 from member {} at height {}", group_id, member_id, ctx.block_height);

        if self.store.round1_info_count(group_id) == group.size {
            self.store.add_pending_group(group_id);
        }
        Ok(())
    }

    pub fn submit_round2(&mut self, ctx: &Context, group_id: GroupId, address: &str, info: Round2Info) -> Result<()> {
        let group = self.group_in_status(group_id, GroupStatus::Round2)?;
        let member_id = info.member_id;
        self.authorized_member(group_id, member_id, address)?;

        if info.encrypted_secret_shares.len() as u64 != group.size - 1 {
            return Err(Error::InvalidLengthEncryptedSecretShares {
                expected: group.size - 1,
                got: info.encrypted_secret_shares.len(),
            });
        }

        self.store.round2_infos.insert((group_id, member_id), info);
        debug!("group {} received round2 from member {} at height {}", group_id, member_id, ctx.block_height);

        if self.store.round2_info_count(group_id) == group.size {
            self.store.add_pending_group(group_id);
        }
        Ok(())
    }

    /// Records that a member derived its key share correctly from every received share.
    pub fn confirm(
        &mut self,
        ctx: &Context,
        group_id: GroupId,
        address: &str,
        member_id: MemberId,
        own_pub_key_sig: Signature,
    ) -> Result<()> {
        let group = self.group_in_status(group_id, GroupStatus::Round3)?;
        let member = self.authorized_member(group_id, member_id, address)?;
        if self.store.complaints.contains_key(&(group_id, member_id)) {
            return Err(Error::MemberAlreadyComplainOrConfirm);
        }

        let own_pub_key = member
            .pub_key
            .ok_or_else(|| Error::Internal(format!("member {} of group {} has no public key", member_id, group_id)))?;
        verify_own_pub_key_signature(member_id, &group.dkg_context, &own_pub_key_sig, &own_pub_key)
            .map_err(|e| Error::ConfirmFailed(e.to_string()))?;

        self.store.confirms.insert((group_id, member_id), Confirm { member_id, own_pub_key_sig });
        debug!("group {} received confirm from member {} at height {}", group_id, member_id, ctx.block_height);

        if self.store.confirm_complain_count(group_id) == group.size {
            self.store.add_pending_group(group_id);
        }
        Ok(())
    }

    /// Accepts complaints from one member against the shares it received.
    ///
    /// All complaints are checked before anything is written. If any of them is
    /// unfounded the whole submission is rejected; otherwise every respondent is
    /// marked malicious and the group falls.
    pub fn complain(&mut self, ctx: &Context, group_id: GroupId, address: &str, complaints: Vec<Complaint>) -> Result<()> {
        self.group_in_status(group_id, GroupStatus::Round3)?;
        let complainant = match complaints.first() {
            Some(c) => c.complainant,
            None => return Err(Error::InvalidArgument("no complaints submitted".to_string())),
        };
        self.authorized_member(group_id, complainant, address)?;
        if self.store.has_responded_round3(group_id, complainant) {
            return Err(Error::MemberAlreadyComplainOrConfirm);
        }

        let complainant_round1 = self.store.round1_info(group_id, complainant)?;
        let mut respondents = BTreeSet::new();
        for c in &complaints {
            if c.complainant != complainant {
                return Err(Error::InvalidComplaint("complaints come from more than one member".to_string()));
            }
            if c.respondent == complainant {
                return Err(Error::InvalidComplaint("member cannot complain about itself".to_string()));
            }
            if !respondents.insert(c.respondent) {
                return Err(Error::InvalidComplaint(format!("duplicate respondent {}", c.respondent)));
            }
            self.store.member(group_id, c.respondent)?;

            let respondent_round1 = self.store.round1_info(group_id, c.respondent)?;
            let respondent_round2 = self.store.round2_info(group_id, c.respondent)?;
            let slot = find_member_slot(c.respondent, complainant)?;
            let enc_share = respondent_round2
                .encrypted_secret_shares
                .get(slot)
                .ok_or(Error::Round2InfoNotFound(c.respondent))?;

            if let Err(e) = verify_complaint(
                &complainant_round1.one_time_pub_key,
                &respondent_round1.one_time_pub_key,
                &c.key_sym,
                &c.signature,
                enc_share,
                complainant,
                &respondent_round1.coefficient_commits,
            ) {
                warn!(
                    "group {}: rejected complaint of member {} against member {}: {}",
                    group_id, complainant, c.respondent, e
                );
                return Err(Error::InvalidComplaint(e.to_string()));
            }
        }

        for respondent in &respondents {
            self.store.member_mut(group_id, *respondent)?.is_malicious = true;
            warn!("group {}: member {} is malicious", group_id, respondent);
        }
        self.store.complaints.insert((group_id, complainant), complaints);
        self.handle_failed_group(ctx, group_id);
        Ok(())
    }
}
