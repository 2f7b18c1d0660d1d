//! Signing requests: signer assignment, partial signatures, aggregation and retries.

use crate::crypto::ecpoint::ECPoint;
use crate::crypto::schnorr::Signature;
use crate::crypto::signing::{
    combine_signatures, compute_commitment, compute_group_pub_nonce, compute_own_binding_factor,
    compute_own_pub_nonce, verify_group_signing_signature, verify_signing_signature,
};
use crate::crypto::vss::feldman_vss::compute_lagrange_coefficient;
use crate::tss::error::{Error, Result};
use crate::tss::keeper::Keeper;
use crate::tss::originator::{signing_message, Content, Originator};
use crate::tss::types::{
    Address, AssignedMember, Context, GroupId, GroupStatus, MemberId, Signing, SigningAttempt, SigningId,
    SigningStatus,
};

use log::{debug, error, info, warn};
use std::collections::BTreeSet;

impl Keeper {
    /// Asks an Active group to sign `content` on behalf of `originator`.
    ///
    /// The request is refused up front when fewer than `threshold` members
    /// could take an assignment, so a created signing always has a first attempt.
    pub fn request_signing(
        &mut self,
        ctx: &Context,
        group_id: GroupId,
        originator: Originator,
        content: &Content,
    ) -> Result<SigningId> {
        originator.validate(&self.params)?;
        let group = self.store.group(group_id)?;
        if group.status != GroupStatus::Active {
            return Err(Error::GroupIsNotActive(group_id));
        }
        let threshold = group.threshold;
        let available = self.available_members(group_id)?.len() as u64;
        if available < threshold {
            return Err(Error::InsufficientSigners { required: threshold, available });
        }

        let signing_id = self.create_signing(ctx, group_id, originator, content)?;
        if let Err(e) = self.initiate_new_signing_round(ctx, signing_id) {
            self.store.signings.remove(&signing_id);
            self.store.signing_count -= 1;
            return Err(e);
        }
        Ok(signing_id)
    }

    fn create_signing(
        &mut self,
        ctx: &Context,
        group_id: GroupId,
        originator: Originator,
        content: &Content,
    ) -> Result<SigningId> {
        let group_pub_key = self.store.group(group_id)?.pub_key.ok_or(Error::GroupIsNotActive(group_id))?;

        let signing_id = self.store.next_signing_id();
        let message = signing_message(&originator, ctx.block_time, signing_id, &content.encode());
        self.store.signings.insert(
            signing_id,
            Signing {
                id: signing_id,
                current_attempt: 0,
                group_id,
                group_pub_key,
                originator,
                message,
                group_pub_nonce: None,
                signature: None,
                status: SigningStatus::Waiting,
                created_height: ctx.block_height,
                fail_reason: None,
            },
        );
        self.store.group_mut(group_id)?.last_used_height = ctx.block_height;
        Ok(signing_id)
    }

    /// Assigns a fresh signer set with fresh DEs to the next attempt of a signing.
    pub(crate) fn initiate_new_signing_round(&mut self, ctx: &Context, signing_id: SigningId) -> Result<()> {
        let signing = self.store.signing(signing_id)?.clone();
        if self.store.group(signing.group_id)?.status != GroupStatus::Active {
            return Err(Error::GroupIsNotActive(signing.group_id));
        }
        let attempt = signing.current_attempt + 1;
        if attempt > self.params.max_signing_attempt {
            return Err(Error::MaxSigningAttemptReached(signing.current_attempt));
        }

        let mut nonce = signing_id.to_be_bytes().to_vec();
        nonce.extend_from_slice(&attempt.to_be_bytes());
        let selected = self.random_assigning_members(ctx, signing.group_id, &nonce)?;
        let mut member_keys = Vec::with_capacity(selected.len());
        for member in &selected {
            let pub_key = member.pub_key.ok_or_else(|| {
                Error::Internal(format!("member {} of group {} has no public key", member.id, member.group_id))
            })?;
            member_keys.push(pub_key);
        }

        let mut des = Vec::with_capacity(selected.len());
        for member in &selected {
            des.push(self.pop_de(&member.address)?);
        }

        let mids: Vec<MemberId> = selected.iter().map(|m| m.id).collect();
        let pub_ds: Vec<ECPoint> = des.iter().map(|de| de.pub_d).collect();
        let pub_es: Vec<ECPoint> = des.iter().map(|de| de.pub_e).collect();
        let commitment = compute_commitment(&mids, &pub_ds, &pub_es)?;

        let mut assigned_members = Vec::with_capacity(selected.len());
        for ((member, pub_key), de) in selected.iter().zip(member_keys).zip(&des) {
            let binding_factor =
                compute_own_binding_factor(member.id, &signing.message, &commitment, &signing.group_pub_key);
            assigned_members.push(AssignedMember {
                member_id: member.id,
                address: member.address.clone(),
                pub_key,
                pub_d: de.pub_d,
                pub_e: de.pub_e,
                binding_factor,
                pub_nonce: compute_own_pub_nonce(&de.pub_d, &de.pub_e, &binding_factor),
            });
        }
        let own_pub_nonces: Vec<ECPoint> = assigned_members.iter().map(|am| am.pub_nonce).collect();
        let group_pub_nonce = compute_group_pub_nonce(&own_pub_nonces)?;

        let expired_height = ctx.block_height + self.params.signing_period;
        self.store.signing_attempts.insert(
            (signing_id, attempt),
            SigningAttempt { signing_id, attempt, expired_height, assigned_members },
        );
        let stored = self.store.signing_mut(signing_id)?;
        stored.current_attempt = attempt;
        stored.group_pub_nonce = Some(group_pub_nonce);
        stored.status = SigningStatus::Waiting;
        self.store.signing_expirations.insert((expired_height, signing_id, attempt));

        info!(
            "signing {} attempt {} assigned to members {:?} until height {}",
            signing_id, attempt, mids, expired_height
        );
        Ok(())
    }

    /// Accepts a partial signature from a member assigned to the current attempt.
    pub fn submit_signature(
        &mut self,
        ctx: &Context,
        signing_id: SigningId,
        member_id: MemberId,
        address: &str,
        signature: Signature,
    ) -> Result<()> {
        let signing = self.store.signing(signing_id)?.clone();
        if signing.status != SigningStatus::Waiting {
            return Err(Error::SigningNotWaiting { signing_id, status: signing.status });
        }
        let attempt = self.store.signing_attempt(signing_id, signing.current_attempt)?.clone();
        if ctx.block_height > attempt.expired_height {
            return Err(Error::SigningAttemptExpired { signing_id, attempt: attempt.attempt });
        }

        let assigned = attempt.find(member_id).ok_or(Error::MemberNotAssigned(member_id))?;
        if assigned.address != address {
            return Err(Error::MemberNotAuthorized { member_id, address: address.to_string() });
        }
        let key = (signing_id, attempt.attempt, member_id);
        if self.store.partial_signatures.contains_key(&key) {
            return Err(Error::AlreadySigned(member_id));
        }
        if signature.r != assigned.pub_nonce {
            return Err(Error::PubNonceNotEqualToSigR(member_id));
        }

        let group_pub_nonce = signing
            .group_pub_nonce
            .ok_or_else(|| Error::Internal(format!("signing {} has no group nonce", signing_id)))?;
        let lagrange = compute_lagrange_coefficient(member_id, &attempt.member_ids())?;
        if let Err(e) = verify_signing_signature(
            &group_pub_nonce,
            &signing.group_pub_key,
            &signing.message,
            &lagrange,
            &signature,
            &assigned.pub_key,
        ) {
            warn!("signing {}: invalid partial signature from member {}: {}", signing_id, member_id, e);
            return Err(Error::InvalidPartialSignature(e.to_string()));
        }

        self.store.partial_signatures.insert(key, signature);
        let received = self.store.partial_signatures(signing_id, attempt.attempt).len();
        debug!(
            "signing {} attempt {}: {}/{} partial signatures",
            signing_id,
            attempt.attempt,
            received,
            attempt.assigned_members.len()
        );
        if received == attempt.assigned_members.len() {
            self.store.add_pending_signing(signing_id);
        }
        Ok(())
    }

    pub(crate) fn process_pending_signings(&mut self, ctx: &Context) {
        let pending = std::mem::take(&mut self.store.pending_signings);
        for signing_id in pending {
            if let Err(e) = self.aggregate_partial_signatures(ctx, signing_id) {
                error!("failed to aggregate signing {}: {}", signing_id, e);
                self.handle_failed_signing(ctx, signing_id, e.to_string());
            }
        }
    }

    fn aggregate_partial_signatures(&mut self, ctx: &Context, signing_id: SigningId) -> Result<()> {
        let signing = self.store.signing(signing_id)?.clone();
        if signing.status != SigningStatus::Waiting {
            return Ok(());
        }
        let attempt = self.store.signing_attempt(signing_id, signing.current_attempt)?.clone();
        let partials = self.store.partial_signatures(signing_id, attempt.attempt);
        if partials.len() != attempt.assigned_members.len() {
            return Ok(());
        }

        let signatures: Vec<Signature> = partials.iter().map(|(_, sig)| *sig).collect();
        let signature = combine_signatures(&signatures).map_err(|e| Error::CombineSignaturesFailed(e.to_string()))?;
        verify_group_signing_signature(&signing.group_pub_key, &signing.message, &signature)
            .map_err(|e| Error::CombineSignaturesFailed(e.to_string()))?;

        let stored = self.store.signing_mut(signing_id)?;
        stored.status = SigningStatus::Success;
        stored.signature = Some(signature);
        self.store.delete_partial_signatures(signing_id, attempt.attempt);
        self.store.signing_expirations.retain(|(_, sid, _)| *sid != signing_id);
        info!("signing {} succeeded at attempt {}", signing_id, attempt.attempt);

        if let Some(cb) = self.callback_of(signing.group_id) {
            cb.on_signing_completed(self, ctx, signing_id, &attempt.addresses());
        }
        Ok(())
    }

    fn finish_signing(&mut self, ctx: &Context, signing_id: SigningId, status: SigningStatus, reason: String) {
        let (group_id, attempt) = match self.store.signing_mut(signing_id) {
            Ok(signing) if signing.status == SigningStatus::Waiting => {
                signing.status = status;
                signing.fail_reason = Some(reason.clone());
                (signing.group_id, signing.current_attempt)
            }
            _ => return,
        };
        self.store.delete_partial_signatures(signing_id, attempt);
        self.store.signing_expirations.retain(|(_, sid, _)| *sid != signing_id);
        self.store.pending_signings.retain(|sid| *sid != signing_id);
        warn!("signing {} is {}: {}", signing_id, status, reason);

        if let Some(cb) = self.callback_of(group_id) {
            cb.on_signing_failed(self, ctx, signing_id);
        }
    }

    pub(crate) fn handle_failed_signing(&mut self, ctx: &Context, signing_id: SigningId, reason: String) {
        self.finish_signing(ctx, signing_id, SigningStatus::Fallen, reason);
    }

    /// Times out every attempt whose deadline has been reached.
    pub(crate) fn process_signing_expirations(&mut self, ctx: &Context) {
        let due: Vec<(u64, SigningId, u64)> = self
            .store
            .signing_expirations
            .range(..=(ctx.block_height, SigningId::MAX, u64::MAX))
            .copied()
            .collect();

        for entry in due {
            self.store.signing_expirations.remove(&entry);
            let (_, signing_id, attempt) = entry;
            match self.store.signing(signing_id) {
                Ok(s) if s.status == SigningStatus::Waiting && s.current_attempt == attempt => {}
                _ => continue,
            }
            self.handle_attempt_timeout(ctx, signing_id, attempt);
        }
    }

    fn handle_attempt_timeout(&mut self, ctx: &Context, signing_id: SigningId, attempt: u64) {
        let (group_id, created_height) = match self.store.signing(signing_id) {
            Ok(s) => (s.group_id, s.created_height),
            Err(_) => return,
        };
        let assigned = match self.store.signing_attempt(signing_id, attempt) {
            Ok(a) => a.assigned_members.clone(),
            Err(e) => {
                error!("signing {}: {}", signing_id, e);
                return;
            }
        };

        let signed: BTreeSet<MemberId> =
            self.store.partial_signatures(signing_id, attempt).into_iter().map(|(mid, _)| mid).collect();
        let idle: Vec<Address> = assigned
            .iter()
            .filter(|am| !signed.contains(&am.member_id))
            .map(|am| am.address.clone())
            .collect();
        warn!("signing {} attempt {} timed out, idle members {:?}", signing_id, attempt, idle);
        for address in &idle {
            if let Err(e) = self.set_member_is_active(group_id, address, false) {
                error!("signing {}: cannot deactivate {}: {}", signing_id, address, e);
            }
        }
        if let Some(cb) = self.callback_of(group_id) {
            cb.on_signing_timeout(self, ctx, signing_id, &idle);
        }
        self.store.delete_partial_signatures(signing_id, attempt);

        if created_height + self.params.signing_lifetime <= ctx.block_height {
            self.finish_signing(ctx, signing_id, SigningStatus::Expired, "signing lifetime exceeded".to_string());
            return;
        }
        if let Err(e) = self.initiate_new_signing_round(ctx, signing_id) {
            self.handle_failed_signing(ctx, signing_id, e.to_string());
        }
    }
}
