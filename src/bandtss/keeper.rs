use crate::bandtss::error::{Error, Result};
use crate::bandtss::hooks::TransitionHooks;
use crate::bandtss::params::Params;
use crate::bandtss::types::{CurrentGroup, GroupTransition, Member};
use crate::bandtss::MODULE_NAME;
use crate::tss::{self, Address, Content, Context, GroupId, Originator, SigningId};

use log::{info, warn};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Default)]
pub(crate) struct State {
    pub(crate) params: Params,
    pub(crate) members: BTreeMap<(GroupId, Address), Member>,
    pub(crate) current_group: Option<CurrentGroup>,
    pub(crate) transition: Option<GroupTransition>,
    pub(crate) transition_count: u64,
}

/// Keeps the module's current group and the membership of the groups it runs on.
///
/// Register it with the tss keeper under [`MODULE_NAME`] so that it receives
/// the lifecycle events of the groups it creates. The tss keeper is passed
/// into every call that needs it and is never touched while the internal
/// state is locked.
pub struct Keeper {
    state: Mutex<State>,
    hooks: Vec<Arc<dyn TransitionHooks>>,
}

impl Keeper {
    pub fn new(params: Params) -> Result<Self> {
        params.validate()?;
        Ok(Keeper { state: Mutex::new(State { params, ..State::default() }), hooks: Vec::new() })
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn TransitionHooks>) -> Self {
        self.hooks.push(hooks);
        self
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn hooks(&self) -> &[Arc<dyn TransitionHooks>] {
        &self.hooks
    }

    pub fn params(&self) -> Params {
        self.state().params.clone()
    }

    pub fn set_params(&self, params: Params) -> Result<()> {
        params.validate()?;
        self.state().params = params;
        Ok(())
    }

    pub fn current_group(&self) -> Option<CurrentGroup> {
        self.state().current_group
    }

    pub fn group_transition(&self) -> Option<GroupTransition> {
        self.state().transition.clone()
    }

    pub fn member(&self, address: &str, group_id: GroupId) -> Result<Member> {
        self.state()
            .members
            .get(&(group_id, address.to_string()))
            .cloned()
            .ok_or_else(|| Error::MemberNotFound { address: address.to_string(), group_id })
    }

    pub fn members(&self, group_id: GroupId) -> Vec<Member> {
        self.state()
            .members
            .range((group_id, String::new())..)
            .take_while(|((gid, _), _)| *gid == group_id)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Registers every member of a tss group as an active module member.
    pub fn add_members(&self, tss: &tss::Keeper, ctx: &Context, group_id: GroupId) -> Result<()> {
        let addresses: Vec<Address> = tss.members(group_id)?.into_iter().map(|m| m.address).collect();

        let mut state = self.state();
        if let Some(address) = addresses.iter().find(|a| state.members.contains_key(&(group_id, (*a).clone()))) {
            return Err(Error::MemberAlreadyExists { address: address.clone(), group_id });
        }
        for address in addresses {
            let member = Member { address: address.clone(), group_id, is_active: true, since: ctx.block_time };
            state.members.insert((group_id, address), member);
        }
        Ok(())
    }

    pub fn delete_members(&self, group_id: GroupId) {
        self.state().members.retain(|(gid, _), _| *gid != group_id);
    }

    /// Marks the member inactive here and in the tss keeper; a member that is
    /// already inactive keeps its original `since`.
    pub fn deactivate_member(&self, tss: &mut tss::Keeper, ctx: &Context, address: &str, group_id: GroupId) -> Result<()> {
        tss.member_by_address(group_id, address)?;
        {
            let mut state = self.state();
            let member = state
                .members
                .get_mut(&(group_id, address.to_string()))
                .ok_or_else(|| Error::MemberNotFound { address: address.to_string(), group_id })?;
            if !member.is_active {
                return Ok(());
            }
            member.is_active = false;
            member.since = ctx.block_time;
        }
        warn!("deactivated member {} of group {}", address, group_id);
        tss.set_member_is_active(group_id, address, false)?;
        Ok(())
    }

    /// Brings a deactivated member back once its penalty period is over.
    pub fn activate_member(&self, tss: &mut tss::Keeper, ctx: &Context, address: &str, group_id: GroupId) -> Result<()> {
        tss.member_by_address(group_id, address)?;
        {
            let mut state = self.state();
            let penalty = state.params.inactive_penalty_duration;
            let member = state
                .members
                .get_mut(&(group_id, address.to_string()))
                .ok_or_else(|| Error::MemberNotFound { address: address.to_string(), group_id })?;
            if member.is_active {
                return Err(Error::MemberAlreadyActive(address.to_string()));
            }
            let until = member.since.saturating_add(penalty);
            if until > ctx.block_time {
                return Err(Error::TooSoonToActivate { address: address.to_string(), until });
            }
            member.is_active = true;
            member.since = ctx.block_time;
        }
        info!("activated member {} of group {}", address, group_id);
        tss.set_member_is_active(group_id, address, true)?;
        Ok(())
    }

    /// Requests a signing of `content` from the current group.
    pub fn create_group_signing(
        &self,
        tss: &mut tss::Keeper,
        ctx: &Context,
        originator: Originator,
        content: &Content,
    ) -> Result<SigningId> {
        let current = self.current_group().ok_or(Error::NoCurrentGroup)?;
        let signing_id = tss.request_signing(ctx, current.group_id, originator, content)?;
        info!("requested signing {} from current group {}", signing_id, current.group_id);
        Ok(signing_id)
    }

    pub(crate) fn module_originator(ctx: &Context) -> Originator {
        Originator::direct(ctx.chain_id.clone(), MODULE_NAME, "")
    }
}
