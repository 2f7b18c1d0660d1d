use crate::bandtss::types::GroupTransition;

/// Observer of finished group transitions.
///
/// Called after the transition has been removed from the keeper, with the
/// last state it reached.
pub trait TransitionHooks: Send + Sync {
    fn on_transition_completed(&self, _transition: &GroupTransition) {}

    fn on_transition_failed(&self, _transition: &GroupTransition) {}
}
