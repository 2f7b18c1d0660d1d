use crate::bandtss::keeper::Keeper;
use crate::bandtss::types::TransitionStatus;
use crate::tss::{self, Address, Context, GroupId, SigningId, TssCallback};

use log::{debug, warn};

impl TssCallback for Keeper {
    fn on_group_creation_completed(&self, tss: &mut tss::Keeper, ctx: &Context, group_id: GroupId) {
        let mut transition = match self.group_transition() {
            Some(t) if t.incoming_group_id == group_id && t.status == TransitionStatus::CreatingGroup => t,
            _ => return,
        };
        if transition.exec_time <= ctx.block_time {
            warn!("group {} became active after its transition exec time", group_id);
            self.end_group_transition(transition, false);
            return;
        }
        transition.incoming_group_pub_key = match tss.group(group_id) {
            Ok(group) => group.pub_key,
            Err(e) => {
                warn!("group transition {}: {}", transition.id, e);
                self.end_group_transition(transition, false);
                return;
            }
        };

        // Without a current group there is nobody to attest the handover.
        if transition.current_group_id.is_none() {
            if let Err(e) = self.add_members(tss, ctx, group_id) {
                warn!("group transition {}: {}", transition.id, e);
                self.end_group_transition(transition, false);
                return;
            }
            transition.status = TransitionStatus::WaitingExecution;
        } else {
            match self.create_transition_signing(tss, ctx, &transition) {
                Ok(signing_id) => {
                    transition.signing_id = Some(signing_id);
                    transition.status = TransitionStatus::WaitingSign;
                }
                Err(e) => {
                    warn!("group transition {}: cannot request attestation: {}", transition.id, e);
                    self.end_group_transition(transition, false);
                    return;
                }
            }
        }
        self.update_transition(&transition);
    }

    fn on_group_creation_failed(&self, _tss: &mut tss::Keeper, _ctx: &Context, group_id: GroupId) {
        if let Some(t) = self.group_transition() {
            if t.incoming_group_id == group_id && t.status == TransitionStatus::CreatingGroup {
                self.end_group_transition(t, false);
            }
        }
    }

    fn on_group_expired(&self, tss: &mut tss::Keeper, ctx: &Context, group_id: GroupId) {
        debug!("group {} expired", group_id);
        self.on_group_creation_failed(tss, ctx, group_id);
    }

    fn on_signing_completed(&self, tss: &mut tss::Keeper, ctx: &Context, signing_id: SigningId, _assigned: &[Address]) {
        let mut transition = match self.group_transition() {
            Some(t) if t.signing_id == Some(signing_id) && t.status == TransitionStatus::WaitingSign => t,
            _ => return,
        };
        if let Err(e) = self.add_members(tss, ctx, transition.incoming_group_id) {
            warn!("group transition {}: {}", transition.id, e);
            self.end_group_transition(transition, false);
            return;
        }
        transition.status = TransitionStatus::WaitingExecution;
        self.update_transition(&transition);
    }

    fn on_signing_failed(&self, _tss: &mut tss::Keeper, _ctx: &Context, signing_id: SigningId) {
        if let Some(t) = self.group_transition() {
            if t.signing_id == Some(signing_id) && t.status == TransitionStatus::WaitingSign {
                self.end_group_transition(t, false);
            }
        }
    }

    fn on_signing_timeout(&self, tss: &mut tss::Keeper, ctx: &Context, signing_id: SigningId, idle: &[Address]) {
        let group_id = match tss.signing(signing_id) {
            Ok(signing) => signing.group_id,
            Err(_) => return,
        };
        for address in idle {
            match self.member(address, group_id) {
                Ok(member) if member.is_active => {}
                _ => continue,
            }
            if let Err(e) = self.deactivate_member(tss, ctx, address, group_id) {
                warn!("cannot deactivate {}: {}", address, e);
            }
        }
    }

    /// The current group and the group being handed over to stay alive.
    fn retain_group(&self, _tss: &tss::Keeper, group_id: GroupId) -> bool {
        self.current_group().is_some_and(|c| c.group_id == group_id)
            || self.group_transition().is_some_and(|t| t.incoming_group_id == group_id)
    }
}
