use crate::common::random::{choose_indices, seeded_rng};
use crate::tss::error::{Error, Result};
use crate::tss::keeper::Keeper;
use crate::tss::types::{Context, GroupId, Member};

use log::info;

impl Keeper {
    /// Toggles the membership of `address` in one group. Its memberships in
    /// other groups are left as they are.
    pub fn set_member_is_active(&mut self, group_id: GroupId, address: &str, is_active: bool) -> Result<()> {
        let member_id = self.member_by_address(group_id, address)?.id;
        let member = self.store.member_mut(group_id, member_id)?;
        if member.is_active != is_active {
            member.is_active = is_active;
            info!(
                "member {} of group {} is now {}",
                address,
                group_id,
                if is_active { "active" } else { "inactive" }
            );
        }
        Ok(())
    }

    /// Members able to take a signing assignment right now: active, honest and
    /// holding at least one unused DE.
    pub fn available_members(&self, group_id: GroupId) -> Result<Vec<Member>> {
        self.store.group(group_id)?;
        Ok(self
            .store
            .group_members(group_id)
            .into_iter()
            .filter(|m| m.is_active && !m.is_malicious && self.has_de(&m.address))
            .collect())
    }

    /// Deterministically draws `threshold` signers out of the available members,
    /// returned in member id order.
    pub(crate) fn random_assigning_members(&self, ctx: &Context, group_id: GroupId, nonce: &[u8]) -> Result<Vec<Member>> {
        let threshold = self.store.group(group_id)?.threshold;
        let available = self.available_members(group_id)?;
        let insufficient = || Error::InsufficientSigners { required: threshold, available: available.len() as u64 };

        let mut rng = seeded_rng(&ctx.rolling_seed, nonce, &ctx.chain_id);
        let picked = choose_indices(&mut rng, available.len(), threshold as usize).ok_or_else(insufficient)?;

        let mut selected: Vec<Member> = picked.into_iter().map(|idx| available[idx].clone()).collect();
        selected.sort_by_key(|m| m.id);
        Ok(selected)
    }
}
