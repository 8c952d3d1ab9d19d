use crate::value_objects::StaticMultipliers;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Risk appetite of a deployed strategy.
///
/// The profile selects the static multiplier table used when AI-sourced
/// multipliers are disabled or rejected by validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskProfile {
    Conservative,
    Moderate,
    Aggressive,
}

impl RiskProfile {
    /// Static fallback multipliers for this profile.
    #[must_use]
    pub fn static_multipliers(&self) -> StaticMultipliers {
        match self {
            RiskProfile::Conservative => StaticMultipliers {
                take_profit: Decimal::new(18, 1), // 1.8
                stop_loss: Decimal::new(85, 2),   // 0.85
            },
            RiskProfile::Moderate => StaticMultipliers {
                take_profit: Decimal::new(25, 1), // 2.5
                stop_loss: Decimal::new(70, 2),   // 0.70
            },
            RiskProfile::Aggressive => StaticMultipliers {
                take_profit: Decimal::new(35, 1), // 3.5
                stop_loss: Decimal::new(50, 2),   // 0.50
            },
        }
    }

    /// Stable label used in logs and persistence.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskProfile::Conservative => "conservative",
            RiskProfile::Moderate => "moderate",
            RiskProfile::Aggressive => "aggressive",
        }
    }
}

/// Why an execution was initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerReason {
    TakeProfit,
    StopLoss,
    Manual,
}

impl TriggerReason {
    /// Stable label used in logs and persistence.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerReason::TakeProfit => "take_profit",
            TriggerReason::StopLoss => "stop_loss",
            TriggerReason::Manual => "manual",
        }
    }
}

impl std::str::FromStr for TriggerReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "take_profit" => Ok(TriggerReason::TakeProfit),
            "stop_loss" => Ok(TriggerReason::StopLoss),
            "manual" => Ok(TriggerReason::Manual),
            other => Err(format!("unknown trigger reason: {other}")),
        }
    }
}

/// Execution lifecycle of a monitored asset.
///
/// Transitions are monotonic for a given trigger instance:
/// `Idle -> Executing -> {Executed | Failed}`. A `Failed` asset may be
/// retried, returning to `Executing`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    #[default]
    Idle,
    Executing,
    Executed,
    Failed,
}

impl ExecutionState {
    /// Whether a new execution may be started from this state.
    #[must_use]
    pub fn can_begin_execution(&self) -> bool {
        matches!(self, ExecutionState::Idle | ExecutionState::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn static_multiplier_table() {
        let m = RiskProfile::Conservative.static_multipliers();
        assert_eq!(m.take_profit, dec!(1.8));
        assert_eq!(m.stop_loss, dec!(0.85));

        let m = RiskProfile::Moderate.static_multipliers();
        assert_eq!(m.take_profit, dec!(2.5));
        assert_eq!(m.stop_loss, dec!(0.70));

        let m = RiskProfile::Aggressive.static_multipliers();
        assert_eq!(m.take_profit, dec!(3.5));
        assert_eq!(m.stop_loss, dec!(0.50));
    }

    #[test]
    fn execution_state_guard() {
        assert!(ExecutionState::Idle.can_begin_execution());
        assert!(ExecutionState::Failed.can_begin_execution());
        assert!(!ExecutionState::Executing.can_begin_execution());
        assert!(!ExecutionState::Executed.can_begin_execution());
    }
}
