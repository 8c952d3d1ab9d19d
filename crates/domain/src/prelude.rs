//! Convenient re-exports for downstream crates.

pub use crate::entities::{ExecutionRecord, MonitoredAsset, Strategy, StrategyId};
pub use crate::enums::{ExecutionState, RiskProfile, TriggerReason};
pub use crate::error::EngineError;
pub use crate::status::AssetStatus;
pub use crate::value_objects::{
    Price, SETTLEMENT_DECIMALS, SettlementAmount, StaticMultipliers, SuggestedMultipliers,
    Thresholds, TriggerToggles, ValidatedMultipliers,
};
