use crate::bandtss::error::{Error, Result};

use serde::{Deserialize, Serialize};

/// Three days.
pub const DEFAULT_MAX_TRANSITION_DURATION: u64 = 3 * 24 * 60 * 60;
/// Ten minutes.
pub const DEFAULT_INACTIVE_PENALTY_DURATION: u64 = 10 * 60;

/// Durations are in seconds of block time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// How far ahead of the current block a transition may be scheduled.
    pub max_transition_duration: u64,
    /// How long a deactivated member waits before it may reactivate.
    pub inactive_penalty_duration: u64,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            max_transition_duration: DEFAULT_MAX_TRANSITION_DURATION,
            inactive_penalty_duration: DEFAULT_INACTIVE_PENALTY_DURATION,
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
        if self.max_transition_duration == 0 {
            return Err(Error::InvalidParams("max_transition_duration must be positive".to_string()));
        }
        Ok(())
    }
}
