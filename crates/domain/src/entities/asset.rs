use crate::value_objects::{Price, Thresholds};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A token holding monitored by a strategy.
///
/// Symbols are unique within one strategy; an asset is exclusively owned by
/// the strategy that tracks it and is removed from the monitored set once
/// sold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoredAsset {
    /// Ticker symbol, unique per strategy.
    pub symbol: String,
    /// Display name.
    pub name: String,
    /// Quantity held.
    pub quantity: Decimal,
    /// Price observed when the strategy was deployed; targets derive from it.
    pub entry_price: Price,
    /// Sell thresholds for this asset.
    pub thresholds: Thresholds,
}

impl MonitoredAsset {
    pub fn new(
        symbol: impl Into<String>,
        name: impl Into<String>,
        quantity: Decimal,
        entry_price: Price,
        thresholds: Thresholds,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            quantity,
            entry_price,
            thresholds,
        }
    }
}
