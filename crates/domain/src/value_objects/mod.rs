//! Value objects shared across the engine.

/// Multiplier validation for AI-sourced and static sell targets.
pub mod multipliers;
/// Price of an asset in the quote currency.
pub mod price;
/// Settlement-asset amounts in fixed-decimal minor units.
pub mod settlement;
/// Per-asset sell thresholds and strategy-level trigger toggles.
pub mod thresholds;

pub use multipliers::{StaticMultipliers, SuggestedMultipliers, ValidatedMultipliers};
pub use price::Price;
pub use settlement::{SETTLEMENT_DECIMALS, SettlementAmount};
pub use thresholds::{Thresholds, TriggerToggles};
