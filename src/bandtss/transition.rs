//! Handover of the current group to a freshly generated one.
//!
//! A transition starts by creating the incoming group. Once its DKG succeeds
//! the current group signs an attestation over the incoming public key and the
//! execution time; only then are the incoming members registered. When the
//! execution time arrives the current group pointer moves to the incoming
//! group. Any failure along the way leaves the current group in place.

use crate::bandtss::error::{Error, Result};
use crate::bandtss::keeper::Keeper;
use crate::bandtss::types::{CurrentGroup, GroupTransition, TransitionStatus};
use crate::bandtss::MODULE_NAME;
use crate::tss::{self, Address, Content, Context, GroupId, GroupStatus, SigningId};

use log::{info, warn};

impl Keeper {
    /// Checks that `exec_time` lies strictly inside the allowed window after `ctx.block_time`.
    pub fn validate_transition_exec_time(&self, ctx: &Context, exec_time: u64) -> Result<()> {
        let max = ctx.block_time.saturating_add(self.params().max_transition_duration);
        if exec_time <= ctx.block_time || exec_time >= max {
            return Err(Error::InvalidExecTime { exec_time, now: ctx.block_time, max });
        }
        Ok(())
    }

    fn ensure_no_transition(&self) -> Result<()> {
        if self.state().transition.is_some() {
            return Err(Error::TransitionInProgress);
        }
        Ok(())
    }

    /// Starts replacing the current group with a new group of `members`.
    ///
    /// Returns the id of the incoming group, which is still in its DKG rounds.
    pub fn transition_group(
        &self,
        tss: &mut tss::Keeper,
        ctx: &Context,
        members: &[Address],
        threshold: u64,
        exec_time: u64,
    ) -> Result<GroupId> {
        self.ensure_no_transition()?;
        self.validate_transition_exec_time(ctx, exec_time)?;

        let group_id = tss.create_group(ctx, members, threshold, MODULE_NAME)?;
        self.set_new_group_transition(tss, ctx, group_id, exec_time, false)?;
        Ok(group_id)
    }

    /// Installs an already Active group without an attestation.
    ///
    /// Only allowed while the module has no current group, so it can bootstrap
    /// the first group but never bypass the outgoing group's approval.
    pub fn force_transition_group(
        &self,
        tss: &tss::Keeper,
        ctx: &Context,
        incoming_group_id: GroupId,
        exec_time: u64,
    ) -> Result<()> {
        self.ensure_no_transition()?;
        self.validate_transition_exec_time(ctx, exec_time)?;
        if self.current_group().is_some() {
            return Err(Error::InvalidIncomingGroup("a current group exists; forced transition is not allowed".to_string()));
        }

        let group = tss.group(incoming_group_id)?;
        if group.status != GroupStatus::Active {
            return Err(Error::InvalidIncomingGroup(format!("group {} is {}", incoming_group_id, group.status)));
        }
        if group.module_owner != MODULE_NAME {
            return Err(Error::InvalidIncomingGroup(format!(
                "group {} is owned by {}",
                incoming_group_id, group.module_owner
            )));
        }

        self.add_members(tss, ctx, incoming_group_id)?;
        self.set_new_group_transition(tss, ctx, incoming_group_id, exec_time, true)?;
        Ok(())
    }

    /// Records a new transition towards `incoming_group_id`.
    ///
    /// A forced transition waits for execution straight away and carries the
    /// incoming public key; otherwise it waits for the incoming DKG.
    pub(crate) fn set_new_group_transition(
        &self,
        tss: &tss::Keeper,
        ctx: &Context,
        incoming_group_id: GroupId,
        exec_time: u64,
        is_force: bool,
    ) -> Result<GroupTransition> {
        self.validate_transition_exec_time(ctx, exec_time)?;
        let current_group_id = self.current_group().map(|c| c.group_id);
        if is_force && current_group_id.is_some() {
            return Err(Error::InvalidIncomingGroup("a current group exists; forced transition is not allowed".to_string()));
        }
        let owner = tss.group(incoming_group_id)?.module_owner;
        if owner != MODULE_NAME {
            return Err(Error::InvalidIncomingGroup(format!("group {} is owned by {}", incoming_group_id, owner)));
        }
        let current_group_pub_key = match current_group_id {
            Some(group_id) => tss.group(group_id)?.pub_key,
            None => None,
        };
        let incoming_group_pub_key = if is_force { tss.group(incoming_group_id)?.pub_key } else { None };
        let status = if is_force { TransitionStatus::WaitingExecution } else { TransitionStatus::CreatingGroup };

        let mut state = self.state();
        if state.transition.is_some() {
            return Err(Error::TransitionInProgress);
        }
        state.transition_count += 1;
        let transition = GroupTransition {
            id: state.transition_count,
            signing_id: None,
            current_group_id,
            current_group_pub_key,
            incoming_group_id,
            incoming_group_pub_key,
            status,
            exec_time,
            is_force,
        };
        state.transition = Some(transition.clone());
        info!(
            "group transition {}: {:?} -> {} is {}",
            transition.id, current_group_id, incoming_group_id, transition.status
        );
        Ok(transition)
    }

    /// Asks the current group to sign the handover to `incoming_pub_key`.
    pub(crate) fn create_transition_signing(
        &self,
        tss: &mut tss::Keeper,
        ctx: &Context,
        transition: &GroupTransition,
    ) -> Result<SigningId> {
        let pub_key = transition
            .incoming_group_pub_key
            .ok_or_else(|| Error::InvalidIncomingGroup("incoming group has no public key".to_string()))?;
        let content = Content::GroupTransition { pub_key, exec_time: transition.exec_time };
        self.create_group_signing(tss, ctx, Self::module_originator(ctx), &content)
    }

    /// Replaces the stored transition; a no-op once it has been removed.
    pub(crate) fn update_transition(&self, transition: &GroupTransition) {
        let mut state = self.state();
        if state.transition.as_ref().map(|t| t.id) == Some(transition.id) {
            info!("group transition {} is {}", transition.id, transition.status);
            state.transition = Some(transition.clone());
        }
    }

    /// Executes the transition once its time has come.
    pub fn end_block(&self, ctx: &Context) {
        let due = match self.group_transition() {
            Some(transition) if transition.exec_time <= ctx.block_time => transition,
            _ => return,
        };
        self.execute_transition(ctx, due);
    }

    fn execute_transition(&self, ctx: &Context, transition: GroupTransition) {
        if transition.status != TransitionStatus::WaitingExecution {
            warn!(
                "group transition {} reached its exec time while {}",
                transition.id, transition.status
            );
            self.end_group_transition(transition, false);
            return;
        }

        if let Some(outgoing) = transition.current_group_id {
            self.delete_members(outgoing);
        }
        self.state().current_group =
            Some(CurrentGroup { group_id: transition.incoming_group_id, active_time: ctx.block_time });
        self.end_group_transition(transition, true);
    }

    /// Removes the transition and reports its outcome.
    pub(crate) fn end_group_transition(&self, mut transition: GroupTransition, success: bool) {
        transition.status = if success { TransitionStatus::Success } else { TransitionStatus::Fallen };
        {
            let mut state = self.state();
            if state.transition.as_ref().map(|t| t.id) == Some(transition.id) {
                state.transition = None;
            }
        }
        if success {
            info!(
                "group transition {} succeeded: current group is {}",
                transition.id, transition.incoming_group_id
            );
            for hooks in self.hooks() {
                hooks.on_transition_completed(&transition);
            }
        } else {
            warn!("group transition {} fell", transition.id);
            for hooks in self.hooks() {
                hooks.on_transition_failed(&transition);
            }
        }
    }
}
