//! Group replacement: which group currently signs for the module, and how it
//! hands over to the next one.

pub mod callback;
pub mod error;
pub mod hooks;
pub mod keeper;
pub mod params;
pub mod transition;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

pub use error::{Error, Result};
pub use hooks::TransitionHooks;
pub use keeper::Keeper;
pub use params::Params;
pub use types::*;

/// Owner name under which the module creates groups and receives their events.
pub const MODULE_NAME: &str = "bandtss";
