use crate::bandtss::hooks::TransitionHooks;
use crate::bandtss::keeper::Keeper;
use crate::bandtss::params::Params;
use crate::bandtss::MODULE_NAME;
use crate::tss::test_utils::{create_active_group_for, new_keeper, TestMember, BLOCK_SECS};
use crate::tss::{self, Address, Context, GroupId};

use std::sync::Arc;

pub const DES_PER_MEMBER: u64 = 5;

/// A tss keeper with a bandtss keeper registered as the owner of its groups.
pub fn new_keepers() -> (tss::Keeper, Arc<Keeper>) {
    register(Keeper::new(Params::default()).unwrap())
}

pub fn new_keepers_with_hooks(hooks: Arc<dyn TransitionHooks>) -> (tss::Keeper, Arc<Keeper>) {
    register(Keeper::new(Params::default()).unwrap().with_hooks(hooks))
}

fn register(bandtss: Keeper) -> (tss::Keeper, Arc<Keeper>) {
    let mut tss = new_keeper();
    let bandtss = Arc::new(bandtss);
    tss.register_callback(MODULE_NAME, bandtss.clone());
    (tss, bandtss)
}

/// Makes a fresh group with DEs the current group through a forced transition
/// executed in the block after `ctx`.
pub fn bootstrap_current_group(
    tss: &mut tss::Keeper,
    bandtss: &Keeper,
    ctx: &Context,
    addresses: &[Address],
    threshold: u64,
) -> (GroupId, Vec<TestMember>) {
    let (group_id, mut members) = create_active_group_for(tss, ctx, addresses, threshold, MODULE_NAME);
    for m in members.iter_mut() {
        m.submit_des(tss, ctx, DES_PER_MEMBER).unwrap();
    }
    bandtss.force_transition_group(tss, ctx, group_id, ctx.block_time + BLOCK_SECS).unwrap();
    bandtss.end_block(&ctx.next_block(BLOCK_SECS));
    assert_eq!(bandtss.current_group().map(|c| c.group_id), Some(group_id));
    (group_id, members)
}
