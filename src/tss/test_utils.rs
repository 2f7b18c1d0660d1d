//! Honest-member simulator driving the keeper through DKG and signing.

use crate::common::random::get_random_scalar;
use crate::crypto::ecpoint::ECPoint;
use crate::crypto::schnorr::Signature;
use crate::crypto::signing::{compute_own_priv_nonce, sign_signing};
use crate::crypto::vss::encryption::{compute_encrypted_secret_shares, decrypt_received_shares, find_member_slot};
use crate::crypto::vss::feldman_vss::{
    compute_lagrange_coefficient, compute_own_private_key, compute_secret_share, verify_secret_share,
};
use crate::crypto::vss::round1::generate_round1_info;
use crate::crypto::vss::round3::{sign_complaint, sign_own_pub_key};
use crate::crypto::vss::Round1Output;
use crate::tss::error::Result;
use crate::tss::keeper::Keeper;
use crate::tss::originator::Originator;
use crate::tss::params::Params;
use crate::tss::types::{Address, Complaint, Context, GroupId, MemberId, Round2Info, SigningId, DE};

use k256::Scalar;
use rand::thread_rng;

pub const CHAIN_ID: &str = "bandchain";
pub const TEST_OWNER: &str = "test";
pub const GENESIS_TIME: u64 = 1_700_000_000;
pub const BLOCK_SECS: u64 = 3;

pub fn new_keeper() -> Keeper {
    Keeper::new(Params::default()).unwrap()
}

pub fn test_ctx(height: u64) -> Context {
    Context::new(height, GENESIS_TIME + height * BLOCK_SECS, CHAIN_ID, b"rolling-seed".to_vec())
}

pub fn addresses(n: usize) -> Vec<Address> {
    prefixed_addresses("member", n)
}

pub fn prefixed_addresses(prefix: &str, n: usize) -> Vec<Address> {
    (1..=n).map(|i| format!("band1{}{}", prefix, i)).collect()
}

pub fn test_originator() -> Originator {
    Originator::direct(CHAIN_ID, "band1requester", "test")
}

/// Local view of one member: the secrets it never hands to the keeper.
#[derive(Clone, Debug)]
pub struct TestMember {
    pub id: MemberId,
    pub address: Address,
    pub round1: Option<Round1Output>,
    pub own_priv_key: Option<Scalar>,
    /// Sends this receiver a share that fails verification.
    pub corrupt_share_for: Option<MemberId>,
    nonces: Vec<(ECPoint, Scalar, Scalar)>,
}

impl TestMember {
    pub fn new(id: MemberId, address: Address) -> Self {
        TestMember { id, address, round1: None, own_priv_key: None, corrupt_share_for: None, nonces: Vec::new() }
    }

    fn round1_output(&self) -> &Round1Output {
        self.round1.as_ref().expect("round1 not run")
    }

    fn one_time_pub_keys(keeper: &Keeper, group_id: GroupId) -> Vec<ECPoint> {
        keeper.store.round1_infos(group_id).iter().map(|info| info.one_time_pub_key).collect()
    }

    pub fn round1(&mut self, keeper: &mut Keeper, ctx: &Context, group_id: GroupId) -> Result<()> {
        let group = keeper.group(group_id)?;
        let out = generate_round1_info(self.id, group.threshold, &group.dkg_context, &mut thread_rng())?;
        let info = out.info.clone();
        self.round1 = Some(out);
        keeper.submit_round1(ctx, group_id, &self.address, info)
    }

    pub fn round2(&self, keeper: &mut Keeper, ctx: &Context, group_id: GroupId) -> Result<()> {
        let out = self.round1_output();
        let pubs = Self::one_time_pub_keys(keeper, group_id);
        let mut shares = compute_encrypted_secret_shares(self.id, &out.one_time_priv_key, &pubs, &out.coefficients)?;
        if let Some(victim) = self.corrupt_share_for {
            let slot = find_member_slot(self.id, victim)?;
            shares[slot] = shares[slot] + Scalar::ONE;
        }
        let info = Round2Info { member_id: self.id, encrypted_secret_shares: shares };
        keeper.submit_round2(ctx, group_id, &self.address, info)
    }

    fn received_shares(&self, keeper: &Keeper, group_id: GroupId) -> Vec<(MemberId, Scalar)> {
        let out = self.round1_output();
        let pubs = Self::one_time_pub_keys(keeper, group_id);
        let enc_lists: Vec<Vec<Scalar>> = (1..=pubs.len() as MemberId)
            .map(|sender| match keeper.store.round2_info(group_id, sender) {
                Ok(info) if sender != self.id => info.encrypted_secret_shares.clone(),
                _ => Vec::new(),
            })
            .collect();
        decrypt_received_shares(self.id, &out.one_time_priv_key, &pubs, &enc_lists).unwrap()
    }

    /// Sums the received shares with its own; needs the Round2 data still in the store.
    pub fn derive_own_key(&mut self, keeper: &Keeper, group_id: GroupId) {
        let mut shares: Vec<Scalar> = self.received_shares(keeper, group_id).into_iter().map(|(_, s)| s).collect();
        shares.push(compute_secret_share(&self.round1_output().coefficients, self.id));
        self.own_priv_key = Some(compute_own_private_key(&shares).unwrap());
    }

    /// Senders whose share to this member does not match their commits.
    pub fn bad_share_senders(&self, keeper: &Keeper, group_id: GroupId) -> Vec<MemberId> {
        self.received_shares(keeper, group_id)
            .into_iter()
            .filter(|(sender, share)| {
                let commits = &keeper.store.round1_info(group_id, *sender).unwrap().coefficient_commits;
                verify_secret_share(self.id, share, commits).is_err()
            })
            .map(|(sender, _)| sender)
            .collect()
    }

    pub fn confirm(&mut self, keeper: &mut Keeper, ctx: &Context, group_id: GroupId) -> Result<()> {
        let own_priv = self.own_priv_key.expect("own key not derived");
        let own_pub = ECPoint::scalar_base_mult(&own_priv);
        let dkg_context = keeper.group(group_id)?.dkg_context;
        let sig = sign_own_pub_key(self.id, &dkg_context, &own_pub, &own_priv, &mut thread_rng())?;
        keeper.confirm(ctx, group_id, &self.address, self.id, sig)
    }

    pub fn complaint_against(&self, keeper: &Keeper, group_id: GroupId, respondent: MemberId) -> Complaint {
        let out = self.round1_output();
        let respondent_pub = keeper.store.round1_info(group_id, respondent).unwrap().one_time_pub_key;
        let (signature, key_sym) =
            sign_complaint(&out.info.one_time_pub_key, &respondent_pub, &out.one_time_priv_key, &mut thread_rng())
                .unwrap();
        Complaint { complainant: self.id, respondent, key_sym, signature }
    }

    pub fn submit_des(&mut self, keeper: &mut Keeper, ctx: &Context, count: u64) -> Result<()> {
        let mut rng = thread_rng();
        let mut des = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let d = get_random_scalar(&mut rng);
            let e = get_random_scalar(&mut rng);
            let de = DE { pub_d: ECPoint::scalar_base_mult(&d), pub_e: ECPoint::scalar_base_mult(&e) };
            self.nonces.push((de.pub_d, d, e));
            des.push(de);
        }
        keeper.submit_des(ctx, &self.address, des)
    }

    pub fn partial_signature(&self, keeper: &Keeper, signing_id: SigningId) -> Signature {
        let result = keeper.signing_result(signing_id).unwrap();
        let attempt = result.current_attempt.unwrap();
        let assigned = attempt.find(self.id).expect("member not assigned");
        let (_, d, e) = self
            .nonces
            .iter()
            .find(|(pub_d, _, _)| *pub_d == assigned.pub_d)
            .expect("unknown DE");
        let own_priv_nonce = compute_own_priv_nonce(d, e, &assigned.binding_factor);
        let lagrange = compute_lagrange_coefficient(self.id, &attempt.member_ids()).unwrap();
        sign_signing(
            &result.signing.group_pub_nonce.unwrap(),
            &result.signing.group_pub_key,
            &result.signing.message,
            &lagrange,
            &own_priv_nonce,
            &self.own_priv_key.unwrap(),
        )
        .unwrap()
    }

    pub fn submit_signature(&self, keeper: &mut Keeper, ctx: &Context, signing_id: SigningId) -> Result<()> {
        let sig = self.partial_signature(keeper, signing_id);
        keeper.submit_signature(ctx, signing_id, self.id, &self.address, sig)
    }
}

pub fn test_members(keeper: &Keeper, group_id: GroupId) -> Vec<TestMember> {
    keeper
        .members(group_id)
        .unwrap()
        .into_iter()
        .map(|m| TestMember::new(m.id, m.address))
        .collect()
}

pub fn run_round1(keeper: &mut Keeper, ctx: &Context, group_id: GroupId, members: &mut [TestMember]) {
    for m in members.iter_mut() {
        m.round1(keeper, ctx, group_id).unwrap();
    }
    keeper.end_block(ctx);
}

pub fn run_round2(keeper: &mut Keeper, ctx: &Context, group_id: GroupId, members: &mut [TestMember]) {
    for m in members.iter() {
        m.round2(keeper, ctx, group_id).unwrap();
    }
    keeper.end_block(ctx);
    for m in members.iter_mut() {
        m.derive_own_key(keeper, group_id);
    }
}

pub fn run_round3(keeper: &mut Keeper, ctx: &Context, group_id: GroupId, members: &mut [TestMember]) {
    for m in members.iter_mut() {
        m.confirm(keeper, ctx, group_id).unwrap();
    }
    keeper.end_block(ctx);
}

/// Runs a full honest DKG for `addresses` under `owner`.
pub fn create_active_group_for(
    keeper: &mut Keeper,
    ctx: &Context,
    addresses: &[Address],
    threshold: u64,
    owner: &str,
) -> (GroupId, Vec<TestMember>) {
    let group_id = keeper.create_group(ctx, addresses, threshold, owner).unwrap();
    let mut members = test_members(keeper, group_id);
    run_round1(keeper, ctx, group_id, &mut members);
    run_round2(keeper, ctx, group_id, &mut members);
    run_round3(keeper, ctx, group_id, &mut members);
    (group_id, members)
}

pub fn create_active_group(keeper: &mut Keeper, ctx: &Context, n: usize, threshold: u64) -> (GroupId, Vec<TestMember>) {
    create_active_group_for(keeper, ctx, &addresses(n), threshold, TEST_OWNER)
}

/// g^(Σ λᵢ xᵢ) over the given member ids.
pub fn reconstruct_pub_key(members: &[TestMember], ids: &[MemberId]) -> ECPoint {
    let secret = ids.iter().fold(Scalar::ZERO, |acc, id| {
        let member = members.iter().find(|m| m.id == *id).unwrap();
        let lagrange = compute_lagrange_coefficient(*id, ids).unwrap();
        acc + lagrange * member.own_priv_key.unwrap()
    });
    ECPoint::scalar_base_mult(&secret)
}

/// Local handles of the members assigned to the current attempt, in member id order.
pub fn assigned_members(keeper: &Keeper, signing_id: SigningId, members: &[TestMember]) -> Vec<TestMember> {
    let attempt = keeper.signing_result(signing_id).unwrap().current_attempt.unwrap();
    attempt
        .member_ids()
        .iter()
        .map(|id| members.iter().find(|m| m.id == *id).unwrap().clone())
        .collect()
}
