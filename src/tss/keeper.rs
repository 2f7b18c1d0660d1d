use crate::crypto::ecpoint::ECPoint;
use crate::crypto::schnorr::Signature;
use crate::crypto::signing;
use crate::tss::callback::TssCallback;
use crate::tss::error::{Error, Result};
use crate::tss::params::Params;
use crate::tss::store::Store;
use crate::tss::types::{
    Group, GroupId, Member, MemberId, PartialSignature, Signing, SigningId, SigningResult,
};

use log::info;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Owner of all groups, nonce queues and signings.
pub struct Keeper {
    pub(crate) store: Store,
    pub(crate) params: Params,
    callbacks: BTreeMap<String, Arc<dyn TssCallback>>,
}

impl Keeper {
    pub fn new(params: Params) -> Result<Self> {
        params.validate()?;
        Ok(Keeper { store: Store::default(), params, callbacks: BTreeMap::new() })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn set_params(&mut self, params: Params) -> Result<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    /// Routes lifecycle events of groups created by `module_owner` to `callback`.
    pub fn register_callback(&mut self, module_owner: impl Into<String>, callback: Arc<dyn TssCallback>) {
        let module_owner = module_owner.into();
        info!("registered tss callback for module {}", module_owner);
        self.callbacks.insert(module_owner, callback);
    }

    pub(crate) fn callback_of(&self, group_id: GroupId) -> Option<Arc<dyn TssCallback>> {
        let owner = &self.store.groups.get(&group_id)?.module_owner;
        self.callbacks.get(owner).cloned()
    }

    pub fn group(&self, group_id: GroupId) -> Result<Group> {
        self.store.group(group_id).cloned()
    }

    pub fn groups(&self) -> Vec<Group> {
        self.store.groups.values().cloned().collect()
    }

    pub fn member(&self, group_id: GroupId, member_id: MemberId) -> Result<Member> {
        self.store.member(group_id, member_id).cloned()
    }

    pub fn members(&self, group_id: GroupId) -> Result<Vec<Member>> {
        self.store.group(group_id)?;
        Ok(self.store.group_members(group_id))
    }

    pub fn member_by_address(&self, group_id: GroupId, address: &str) -> Result<Member> {
        self.members(group_id)?
            .into_iter()
            .find(|m| m.address == address)
            .ok_or_else(|| Error::AddressNotMember { group_id, address: address.to_string() })
    }

    pub fn signing(&self, signing_id: SigningId) -> Result<Signing> {
        self.store.signing(signing_id).cloned()
    }

    pub fn signing_result(&self, signing_id: SigningId) -> Result<SigningResult> {
        let signing = self.store.signing(signing_id)?.clone();
        let current_attempt = self.store.signing_attempt(signing_id, signing.current_attempt).ok().cloned();
        let received_partial_signatures = self
            .store
            .partial_signatures(signing_id, signing.current_attempt)
            .into_iter()
            .map(|(member_id, signature)| PartialSignature {
                signing_id,
                attempt: signing.current_attempt,
                member_id,
                signature,
            })
            .collect();
        Ok(SigningResult { signing, current_attempt, received_partial_signatures })
    }

    /// Checks a finished group signature over `message`.
    pub fn verify_group_signing_signature(
        &self,
        group_id: GroupId,
        message: &[u8],
        signature: &Signature,
    ) -> Result<()> {
        let group = self.store.group(group_id)?;
        let pub_key: ECPoint = group
            .pub_key
            .ok_or(Error::GroupIsNotActive(group_id))?;
        signing::verify_group_signing_signature(&pub_key, message, signature)?;
        Ok(())
    }
}
