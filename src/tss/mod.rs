//! Group lifecycle, nonce pool and signing coordination.

pub mod callback;
pub mod de;
pub mod dkg;
pub mod end_block;
pub mod error;
pub mod group;
pub mod keeper;
pub mod member;
pub mod originator;
pub mod params;
pub mod signing;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

pub use callback::TssCallback;
pub use error::{Error, Result};
pub use keeper::Keeper;
pub use originator::{Content, Originator};
pub use params::Params;
pub use types::*;
