//! Domain entities.

/// Monitored asset under a strategy.
pub mod asset;
/// Append-only execution records.
pub mod execution_record;
/// Strategy aggregate root.
pub mod strategy;

pub use asset::MonitoredAsset;
pub use execution_record::ExecutionRecord;
pub use strategy::{Strategy, StrategyId};
