use crate::value_objects::Price;
use serde::{Deserialize, Serialize};

/// Per-asset sell thresholds.
///
/// Both targets are optional; the engine treats each side independently and
/// does not enforce `take_profit > stop_loss` (an upstream advisory may hand
/// out contradictory values).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub take_profit: Option<Price>,
    pub stop_loss: Option<Price>,
}

impl Thresholds {
    #[must_use]
    pub fn new(take_profit: Option<Price>, stop_loss: Option<Price>) -> Self {
        Self {
            take_profit,
            stop_loss,
        }
    }
}

/// Strategy-level switches for each trigger side.
///
/// A disabled side never sets its hit flag, regardless of thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerToggles {
    pub take_profit: bool,
    pub stop_loss: bool,
}

impl Default for TriggerToggles {
    fn default() -> Self {
        Self {
            take_profit: true,
            stop_loss: true,
        }
    }
}
