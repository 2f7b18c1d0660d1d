pub mod ecpoint;
pub mod schnorr;
pub mod signing;
pub mod vss;

/// Dense 1..=n index of a member inside its group.
pub type MemberId = u64;
