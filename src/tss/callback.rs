use crate::tss::keeper::Keeper;
use crate::tss::types::{Address, Context, GroupId, SigningId};

/// Lifecycle events the core reports to the module that owns a group.
///
/// Every method defaults to a no-op, so an owner implements only what it
/// reacts to. Callbacks run synchronously, exactly once per transition, and
/// receive the keeper so they can issue follow-up requests such as a new
/// signing.
pub trait TssCallback: Send + Sync {
    fn on_group_creation_completed(&self, _tss: &mut Keeper, _ctx: &Context, _group_id: GroupId) {}

    fn on_group_creation_failed(&self, _tss: &mut Keeper, _ctx: &Context, _group_id: GroupId) {}

    fn on_group_expired(&self, _tss: &mut Keeper, _ctx: &Context, _group_id: GroupId) {}

    fn on_signing_completed(&self, _tss: &mut Keeper, _ctx: &Context, _signing_id: SigningId, _assigned: &[Address]) {}

    fn on_signing_failed(&self, _tss: &mut Keeper, _ctx: &Context, _signing_id: SigningId) {}

    fn on_signing_timeout(&self, _tss: &mut Keeper, _ctx: &Context, _signing_id: SigningId, _idle: &[Address]) {}

    /// Veto on idle-lifetime expiry of an Active group.
    fn retain_group(&self, _tss: &Keeper, _group_id: GroupId) -> bool {
        false
    }
}

#[cfg(test)]
pub(crate) mod recorder {
    use super::*;
    use std::sync::Mutex;

    /// Records every event it receives, for assertions in tests.
    #[derive(Default)]
    pub struct RecordingCallback {
        pub events: Mutex<Vec<String>>,
        pub retained: Mutex<Vec<GroupId>>,
    }

    impl RecordingCallback {
        pub fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn push(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl TssCallback for RecordingCallback {
        fn on_group_creation_completed(&self, _tss: &mut Keeper, _ctx: &Context, group_id: GroupId) {
            self.push(format!("group_completed:{}", group_id));
        }

        fn on_group_creation_failed(&self, _tss: &mut Keeper, _ctx: &Context, group_id: GroupId) {
            self.push(format!("group_failed:{}", group_id));
        }

        fn on_group_expired(&self, _tss: &mut Keeper, _ctx: &Context, group_id: GroupId) {
            self.push(format!("group_expired:{}", group_id));
        }

        fn on_signing_completed(&self, _tss: &mut Keeper, _ctx: &Context, signing_id: SigningId, assigned: &[Address]) {
            self.push(format!("signing_completed:{}:{}", signing_id, assigned.len()));
        }

        fn on_signing_failed(&self, _tss: &mut Keeper, _ctx: &Context, signing_id: SigningId) {
            self.push(format!("signing_failed:{}", signing_id));
        }

        fn on_signing_timeout(&self, _tss: &mut Keeper, _ctx: &Context, signing_id: SigningId, idle: &[Address]) {
            self.push(format!("signing_timeout:{}:{}", signing_id, idle.join(",")));
        }

        fn retain_group(&self, _tss: &Keeper, group_id: GroupId) -> bool {
            self.retained.lock().unwrap().contains(&group_id)
        }
    }
}
