use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Static multiplier pair from the risk-profile table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticMultipliers {
    pub take_profit: Decimal,
    pub stop_loss: Decimal,
}

/// Raw multiplier suggestion from the advisory client.
///
/// Untrusted numeric input: either field may be absent or out of range and
/// must pass [`SuggestedMultipliers::validated`] before use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedMultipliers {
    pub take_profit: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
}

/// Multipliers that survived range validation.
///
/// A rejected field is `None` and the caller falls back to the static
/// risk-profile table for that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidatedMultipliers {
    pub take_profit: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
}

impl SuggestedMultipliers {
    /// Applies the range rules: a take-profit multiplier must be greater
    /// than 1.0, a stop-loss multiplier less than 1.0. Violations are
    /// dropped, not clamped.
    #[must_use]
    pub fn validated(&self) -> ValidatedMultipliers {
        ValidatedMultipliers {
            take_profit: self.take_profit.filter(|m| *m > Decimal::ONE),
            stop_loss: self.stop_loss.filter(|m| *m < Decimal::ONE && *m > Decimal::ZERO),
        }
    }
}

impl ValidatedMultipliers {
    /// Resolves the final multiplier pair, filling rejected or absent fields
    /// from the static table.
    #[must_use]
    pub fn or_static(&self, fallback: StaticMultipliers) -> StaticMultipliers {
        StaticMultipliers {
            take_profit: self.take_profit.unwrap_or(fallback.take_profit),
            stop_loss: self.stop_loss.unwrap_or(fallback.stop_loss),
        }
    }

    /// Whether both fields were rejected or absent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.take_profit.is_none() && self.stop_loss.is_none()
    }
}
