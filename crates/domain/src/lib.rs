//! Core domain model for the HODL engine.
//!
//! This crate defines the persistent and derived state the trigger engine
//! operates on:
//! - Strategy aggregate and monitored assets
//! - Per-asset trigger status and execution lifecycle
//! - Append-only execution records
//! - Value objects for prices, thresholds, multipliers and settlement amounts
//! - The shared error taxonomy

/// Prelude module for convenient imports.
pub mod prelude;

/// Domain entities (strategy aggregate, monitored assets, execution records).
pub mod entities;
/// Shared enums (risk profile, trigger reason, execution state).
pub mod enums;
/// Error taxonomy shared across the engine.
pub mod error;
/// Per-asset trigger and execution status.
pub mod status;
/// Value objects (price, thresholds, multipliers, settlement amounts).
pub mod value_objects;

pub use entities::{ExecutionRecord, MonitoredAsset, Strategy, StrategyId};
pub use enums::{ExecutionState, RiskProfile, TriggerReason};
pub use error::EngineError;
pub use status::AssetStatus;
pub use value_objects::{
    Price, SettlementAmount, StaticMultipliers, SuggestedMultipliers, Thresholds, TriggerToggles,
    ValidatedMultipliers,
};
