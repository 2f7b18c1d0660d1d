use crate::tss::error::{Error, Result};

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_GROUP_SIZE: u64 = 20;
pub const DEFAULT_MAX_DE_SIZE: u64 = 100;
pub const DEFAULT_CREATION_PERIOD: u64 = 30_000;
pub const DEFAULT_SIGNING_PERIOD: u64 = 100;
pub const DEFAULT_MAX_SIGNING_ATTEMPT: u64 = 5;
pub const DEFAULT_SIGNING_LIFETIME: u64 = 1_000;
pub const DEFAULT_MAX_MEMO_LENGTH: u64 = 100;

/// Knobs of the coordination core. Periods and lifetimes are counted in blocks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    pub max_group_size: u64,
    /// Unused DE pairs an address may hold at once.
    pub max_de_size: u64,
    /// Blocks a group may spend in the DKG rounds before it falls.
    pub creation_period: u64,
    /// Blocks an assigned signer set has to answer before the attempt times out.
    pub signing_period: u64,
    pub max_signing_attempt: u64,
    /// Absolute age after which a waiting signing expires, whatever its attempt count.
    pub signing_lifetime: u64,
    /// Blocks an Active group may stay unused before it expires. Zero disables expiry.
    pub group_lifetime: u64,
    pub max_memo_length: u64,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            max_group_size: DEFAULT_MAX_GROUP_SIZE,
            max_de_size: DEFAULT_MAX_DE_SIZE,
            creation_period: DEFAULT_CREATION_PERIOD,
            signing_period: DEFAULT_SIGNING_PERIOD,
            max_signing_attempt: DEFAULT_MAX_SIGNING_ATTEMPT,
            signing_lifetime: DEFAULT_SIGNING_LIFETIME,
            group_lifetime: 0,
            max_memo_length: DEFAULT_MAX_MEMO_LENGTH,
        }
    }
}

impl Params {
    pub fn from_json(data: &str) -> Result<Self> {
        let params: Params = serde_json::from_str(data).map_err(|e| Error::InvalidParams(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        let non_zero = [
            ("max_group_size", self.max_group_size),
            ("max_de_size", self.max_de_size),
            ("creation_period", self.creation_period),
            ("signing_period", self.signing_period),
            ("max_signing_attempt", self.max_signing_attempt),
            ("signing_lifetime", self.signing_lifetime),
        ];
        for (name, value) in non_zero {
            if value == 0 {
                return Err(Error::InvalidParams(format!("{} must be positive", name)));
            }
        }
        if self.signing_lifetime < self.signing_period {
            return Err(Error::InvalidParams(format!(
                "signing_lifetime {} is shorter than signing_period {}",
                self.signing_lifetime, self.signing_period
            )));
        }
        Ok(())
    }
}
