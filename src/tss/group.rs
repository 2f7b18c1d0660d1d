//! Group lifecycle: creation, round advancement, failure and expiry.

use crate::common::hash::hash_labeled;
use crate::crypto::ecpoint::ECPoint;
use crate::crypto::vss::feldman_vss::{compute_group_public_key, compute_own_public_key, sum_commits};
use crate::tss::error::{Error, Result};
use crate::tss::keeper::Keeper;
use crate::tss::types::{Address, Context, Group, GroupId, GroupStatus, Member, MemberId};

use log::{error, info, warn};
use std::collections::BTreeSet;

/// Binds every DKG artifact of a run to its group id, member list, threshold
/// and the chain randomness at creation time.
pub fn compute_dkg_context(ctx: &Context, group_id: GroupId, members: &[Address], threshold: u64) -> Vec<u8> {
    let group_bz = group_id.to_be_bytes();
    let threshold_bz = threshold.to_be_bytes();
    let mut inputs: Vec<&[u8]> = Vec::with_capacity(members.len() + 4);
    inputs.push(&group_bz);
    inputs.push(&threshold_bz);
    inputs.extend(members.iter().map(|m| m.as_bytes()));
    inputs.push(&ctx.rolling_seed);
    inputs.push(ctx.chain_id.as_bytes());
    hash_labeled("dkgContext", &inputs).to_vec()
}

impl Keeper {
    /// Registers a new group in Round1. Member ids follow the order of `members`, starting at 1.
    pub fn create_group(
        &mut self,
        ctx: &Context,
        members: &[Address],
        threshold: u64,
        module_owner: &str,
    ) -> Result<GroupId> {
        let size = members.len() as u64;
        if size == 0 || size > self.params.max_group_size {
            return Err(Error::InvalidGroupSize { size, max: self.params.max_group_size });
        }
        if threshold == 0 || threshold > size {
            return Err(Error::InvalidThreshold { threshold, size });
        }
        let mut seen = BTreeSet::new();
        for address in members {
            if address.is_empty() {
                return Err(Error::InvalidArgument("member address cannot be empty".to_string()));
            }
            if !seen.insert(address.as_str()) {
                return Err(Error::DuplicateMember(address.clone()));
            }
        }

        let group_id = self.store.next_group_id();
        let dkg_context = compute_dkg_context(ctx, group_id, members, threshold);
        self.store.groups.insert(
            group_id,
            Group {
                id: group_id,
                size,
                threshold,
                pub_key: None,
                status: GroupStatus::Round1,
                dkg_context,
                module_owner: module_owner.to_string(),
                created_height: ctx.block_height,
                last_used_height: ctx.block_height,
            },
        );
        for (idx, address) in members.iter().enumerate() {
            let member_id = idx as MemberId + 1;
            self.store.members.insert(
                (group_id, member_id),
                Member {
                    id: member_id,
                    group_id,
                    address: address.clone(),
                    pub_key: None,
                    is_malicious: false,
                    is_active: true,
                },
            );
        }
        self.store
            .group_deadlines
            .insert((ctx.block_height + self.params.creation_period, group_id));

        info!(
            "created group {} ({}-of-{}) for module {} at height {}",
            group_id, threshold, size, module_owner, ctx.block_height
        );
        Ok(group_id)
    }

    /// Moves every group whose current round is complete to its next status.
    pub(crate) fn process_pending_groups(&mut self, ctx: &Context) {
        let pending = std::mem::take(&mut self.store.pending_groups);
        for group_id in pending {
            let status = match self.store.group(group_id) {
                Ok(group) => group.status,
                Err(_) => continue,
            };
            let result = match status {
                GroupStatus::Round1 => self.finish_round1(group_id),
                GroupStatus::Round2 => self.finish_round2(group_id),
                GroupStatus::Round3 => self.finish_round3(ctx, group_id),
                _ => Ok(()),
            };
            if let Err(e) = result {
                error!("failed to advance group {} from {}: {}", group_id, status, e);
                self.handle_failed_group(ctx, group_id);
            }
        }
    }

    fn finish_round1(&mut self, group_id: GroupId) -> Result<()> {
        let group = self.store.group(group_id)?;
        if self.store.round1_info_count(group_id) != group.size {
            return Ok(());
        }

        let infos = self.store.round1_infos(group_id);
        let all_commits: Vec<Vec<ECPoint>> = infos.iter().map(|info| info.coefficient_commits.clone()).collect();
        let accumulated = sum_commits(&all_commits)?;

        let mut own_pub_keys = Vec::with_capacity(infos.len());
        for member in self.store.group_members(group_id) {
            own_pub_keys.push((member.id, compute_own_public_key(&accumulated, member.id)?));
        }

        for (member_id, pub_key) in own_pub_keys {
            self.store.member_mut(group_id, member_id)?.pub_key = Some(pub_key);
        }
        self.store.accumulated_commits.insert(group_id, accumulated);
        self.store.group_mut(group_id)?.status = GroupStatus::Round2;
        info!("group {} moved to {}", group_id, GroupStatus::Round2);
        Ok(())
    }

    fn finish_round2(&mut self, group_id: GroupId) -> Result<()> {
        let group = self.store.group(group_id)?;
        if self.store.round2_info_count(group_id) != group.size {
            return Ok(());
        }
        self.store.group_mut(group_id)?.status = GroupStatus::Round3;
        info!("group {} moved to {}", group_id, GroupStatus::Round3);
        Ok(())
    }

    fn finish_round3(&mut self, ctx: &Context, group_id: GroupId) -> Result<()> {
        let group = self.store.group(group_id)?;
        if self.store.confirm_complain_count(group_id) != group.size {
            return Ok(());
        }
        if self.store.group_members(group_id).iter().any(|m| m.is_malicious) {
            self.handle_failed_group(ctx, group_id);
            return Ok(());
        }

        let a0_commits: Vec<ECPoint> = self
            .store
            .round1_infos(group_id)
            .iter()
            .filter_map(|info| info.coefficient_commits.first().copied())
            .collect();
        let pub_key = compute_group_public_key(&a0_commits)?;
        match self.store.accumulated_commits.get(&group_id).and_then(|acc| acc.first()) {
            Some(acc0) if *acc0 == pub_key => {}
            _ => return Err(Error::Internal(format!("accumulated commits of group {} are inconsistent", group_id))),
        }

        let group = self.store.group_mut(group_id)?;
        group.status = GroupStatus::Active;
        group.pub_key = Some(pub_key);
        group.last_used_height = ctx.block_height;
        self.store.delete_interim_dkg_data(group_id);
        self.store.group_deadlines.retain(|(_, gid)| *gid != group_id);
        info!("group {} is active with public key {}", group_id, pub_key);

        if let Some(cb) = self.callback_of(group_id) {
            cb.on_group_creation_completed(self, ctx, group_id);
        }
        Ok(())
    }

    /// Terminates a group that cannot finish its DKG.
    pub(crate) fn handle_failed_group(&mut self, ctx: &Context, group_id: GroupId) {
        match self.store.group_mut(group_id) {
            Ok(group) if group.status.is_creating() => group.status = GroupStatus::Fallen,
            _ => return,
        }
        self.store.delete_interim_dkg_data(group_id);
        self.store.group_deadlines.retain(|(_, gid)| *gid != group_id);
        self.store.pending_groups.retain(|gid| *gid != group_id);
        warn!("group {} fell during creation at height {}", group_id, ctx.block_height);

        if let Some(cb) = self.callback_of(group_id) {
            cb.on_group_creation_failed(self, ctx, group_id);
        }
    }

    /// Members that owe a submission for the group's current round.
    fn non_responders(&self, group: &Group) -> Vec<Member> {
        self.store
            .group_members(group.id)
            .into_iter()
            .filter(|m| {
                let key = (group.id, m.id);
                match group.status {
                    GroupStatus::Round1 => !self.store.round1_infos.contains_key(&key),
                    GroupStatus::Round2 => !self.store.round2_infos.contains_key(&key),
                    GroupStatus::Round3 => !self.store.has_responded_round3(group.id, m.id),
                    _ => false,
                }
            })
            .collect()
    }

    /// Fails every group still in the DKG rounds past its creation period and
    /// deactivates the members that held it up.
    pub(crate) fn process_group_deadlines(&mut self, ctx: &Context) {
        let due: Vec<(u64, GroupId)> = self
            .store
            .group_deadlines
            .range(..=(ctx.block_height, GroupId::MAX))
            .copied()
            .collect();

        for entry in due {
            self.store.group_deadlines.remove(&entry);
            let group = match self.store.group(entry.1) {
                Ok(group) if group.status.is_creating() => group.clone(),
                _ => continue,
            };
            for member in self.non_responders(&group) {
                warn!("member {} of group {} missed {}", member.address, group.id, group.status);
                if let Err(e) = self.set_member_is_active(group.id, &member.address, false) {
                    error!("group {}: cannot deactivate {}: {}", group.id, member.address, e);
                }
            }
            self.handle_failed_group(ctx, group.id);
        }
    }

    /// Expires Active groups unused for `group_lifetime` blocks, unless their owner retains them.
    pub(crate) fn process_group_lifetimes(&mut self, ctx: &Context) {
        let lifetime = self.params.group_lifetime;
        if lifetime == 0 {
            return;
        }
        let due: Vec<GroupId> = self
            .store
            .groups
            .values()
            .filter(|g| g.status == GroupStatus::Active && g.last_used_height + lifetime <= ctx.block_height)
            .map(|g| g.id)
            .collect();

        for group_id in due {
            let callback = self.callback_of(group_id);
            if callback.as_ref().is_some_and(|cb| cb.retain_group(self, group_id)) {
                continue;
            }
            if let Ok(group) = self.store.group_mut(group_id) {
                group.status = GroupStatus::Expired;
            }
            info!("group {} expired at height {}", group_id, ctx.block_height);
            if let Some(cb) = callback {
                cb.on_group_expired(self, ctx, group_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tss::callback::recorder::RecordingCallback;
    use crate::tss::test_utils::*;
    use std::sync::Arc;

    #[test]
    fn test_create_group_validation() {
        let mut keeper = new_keeper();
        let ctx = test_ctx(1);
        let members = addresses(3);

        assert!(matches!(
            keeper.create_group(&ctx, &members, 0, TEST_OWNER),
            Err(Error::InvalidThreshold { threshold: 0, size: 3 })
        ));
        assert!(matches!(
            keeper.create_group(&ctx, &members, 4, TEST_OWNER),
            Err(Error::InvalidThreshold { .. })
        ));
        assert!(matches!(keeper.create_group(&ctx, &[], 1, TEST_OWNER), Err(Error::InvalidGroupSize { .. })));

        let dup = vec![members[0].clone(), members[1].clone(), members[0].clone()];
        assert!(matches!(keeper.create_group(&ctx, &dup, 2, TEST_OWNER), Err(Error::DuplicateMember(_))));

        let too_many = addresses(keeper.params().max_group_size as usize + 1);
        assert!(matches!(keeper.create_group(&ctx, &too_many, 2, TEST_OWNER), Err(Error::InvalidGroupSize { .. })));

        // nothing was allocated by the rejected calls
        assert!(keeper.groups().is_empty());
    }

    #[test]
    fn test_create_group() {
        let mut keeper = new_keeper();
        let ctx = test_ctx(10);
        let members = addresses(5);
        let group_id = keeper.create_group(&ctx, &members, 3, TEST_OWNER).unwrap();
        assert_eq!(group_id, 1);

        let group = keeper.group(group_id).unwrap();
        assert_eq!(group.status, GroupStatus::Round1);
        assert_eq!(group.pub_key, None);
        assert_eq!((group.size, group.threshold), (5, 3));
        assert_eq!(group.dkg_context, compute_dkg_context(&ctx, group_id, &members, 3));

        let stored = keeper.members(group_id).unwrap();
        assert_eq!(stored.len(), 5);
        assert_eq!(stored[2].id, 3);
        assert_eq!(stored[2].address, members[2]);

        let second = keeper.create_group(&ctx, &members, 3, TEST_OWNER).unwrap();
        assert_ne!(keeper.group(second).unwrap().dkg_context, group.dkg_context);
    }

    #[test]
    fn test_dkg_completes_with_honest_members() {
        let mut keeper = new_keeper();
        let recorder = Arc::new(RecordingCallback::default());
        keeper.register_callback(TEST_OWNER, recorder.clone());

        let (group_id, members) = create_active_group(&mut keeper, &test_ctx(1), 5, 3);
        let group = keeper.group(group_id).unwrap();
        assert_eq!(group.status, GroupStatus::Active);
        let pub_key = group.pub_key.unwrap();
        assert_eq!(recorder.events(), vec![format!("group_completed:{}", group_id)]);

        // every member's verification key matches its derived share
        for m in &members {
            let stored = keeper.member(group_id, m.id).unwrap();
            assert_eq!(stored.pub_key, Some(ECPoint::scalar_base_mult(&m.own_priv_key.unwrap())));
        }

        // any threshold subset interpolates to the group key
        assert_eq!(reconstruct_pub_key(&members, &[1, 2, 3]), pub_key);
        assert_eq!(reconstruct_pub_key(&members, &[2, 4, 5]), pub_key);
        assert_ne!(reconstruct_pub_key(&members, &[2, 4]), pub_key);

        // interim data is gone once the group is active
        assert_eq!(keeper.store.round1_info_count(group_id), 0);
        assert_eq!(keeper.store.round2_info_count(group_id), 0);
        assert!(!keeper.store.accumulated_commits.contains_key(&group_id));
    }

    #[test]
    fn test_round_advances_only_in_end_block() {
        let mut keeper = new_keeper();
        let ctx = test_ctx(1);
        let group_id = keeper.create_group(&ctx, &addresses(2), 2, TEST_OWNER).unwrap();
        let mut members = test_members(&keeper, group_id);
        for m in members.iter_mut() {
            m.round1(&mut keeper, &ctx, group_id).unwrap();
        }
        assert_eq!(keeper.group(group_id).unwrap().status, GroupStatus::Round1);
        keeper.end_block(&ctx);
        assert_eq!(keeper.group(group_id).unwrap().status, GroupStatus::Round2);
    }

    #[test]
    fn test_group_falls_at_creation_deadline() {
        let mut keeper = new_keeper();
        let recorder = Arc::new(RecordingCallback::default());
        keeper.register_callback(TEST_OWNER, recorder.clone());

        let ctx = test_ctx(1);
        let group_id = keeper.create_group(&ctx, &addresses(3), 2, TEST_OWNER).unwrap();
        let mut members = test_members(&keeper, group_id);
        members[0].round1(&mut keeper, &ctx, group_id).unwrap();
        members[1].round1(&mut keeper, &ctx, group_id).unwrap();

        let before = test_ctx(ctx.block_height + keeper.params().creation_period - 1);
        keeper.end_block(&before);
        assert_eq!(keeper.group(group_id).unwrap().status, GroupStatus::Round1);

        let deadline = test_ctx(ctx.block_height + keeper.params().creation_period);
        keeper.end_block(&deadline);
        assert_eq!(keeper.group(group_id).unwrap().status, GroupStatus::Fallen);
        assert_eq!(recorder.events(), vec![format!("group_failed:{}", group_id)]);

        // only the silent member is deactivated
        let stored = keeper.members(group_id).unwrap();
        assert!(stored[0].is_active && stored[1].is_active);
        assert!(!stored[2].is_active);
        assert_eq!(keeper.store.round1_info_count(group_id), 0);
    }

    #[test]
    fn test_creation_deadline_keeps_other_groups_active() {
        let mut keeper = new_keeper();
        let ctx = test_ctx(1);
        let (active, _) = create_active_group(&mut keeper, &ctx, 3, 2);

        let stalled = keeper.create_group(&ctx, &addresses(3), 2, TEST_OWNER).unwrap();
        keeper.end_block(&test_ctx(ctx.block_height + keeper.params().creation_period));
        assert_eq!(keeper.group(stalled).unwrap().status, GroupStatus::Fallen);

        assert!(keeper.members(stalled).unwrap().iter().all(|m| !m.is_active));
        assert!(keeper.members(active).unwrap().iter().all(|m| m.is_active));
    }

    #[test]
    fn test_group_lifetime_expiry_and_retain() {
        let mut keeper = new_keeper();
        let mut params = keeper.params().clone();
        params.group_lifetime = 10;
        keeper.set_params(params).unwrap();
        let recorder = Arc::new(RecordingCallback::default());
        keeper.register_callback(TEST_OWNER, recorder.clone());

        let (retained, _) = create_active_group(&mut keeper, &test_ctx(1), 2, 2);
        let (expiring, _) = create_active_group(&mut keeper, &test_ctx(1), 2, 2);
        recorder.retained.lock().unwrap().push(retained);

        keeper.end_block(&test_ctx(5));
        assert_eq!(keeper.group(expiring).unwrap().status, GroupStatus::Active);

        keeper.end_block(&test_ctx(20));
        assert_eq!(keeper.group(expiring).unwrap().status, GroupStatus::Expired);
        assert_eq!(keeper.group(retained).unwrap().status, GroupStatus::Active);
        assert!(recorder.events().contains(&format!("group_expired:{}", expiring)));
        assert!(!recorder.events().contains(&format!("group_expired:{}", retained)));
    }
}
