use crate::tss::keeper::Keeper;
use crate::tss::types::Context;

use log::debug;

impl Keeper {
    /// Advances every group and signing that became due in this block.
    ///
    /// Completed rounds and fully signed attempts go first, in the order they
    /// completed; deadlines are handled afterwards. Calling it when nothing is
    /// due leaves the state untouched.
    pub fn end_block(&mut self, ctx: &Context) {
        debug!(
            "end block {}: {} pending groups, {} pending signings",
            ctx.block_height,
            self.store.pending_groups.len(),
            self.store.pending_signings.len()
        );
        self.process_pending_groups(ctx);
        self.process_pending_signings(ctx);
        self.process_group_deadlines(ctx);
        self.process_signing_expirations(ctx);
        self.process_group_lifetimes(ctx);
    }
}
