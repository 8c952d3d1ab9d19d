use crate::enums::ExecutionState;
use crate::value_objects::{Price, SettlementAmount};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-asset trigger and execution status.
///
/// Derived from quote observations and settlement outcomes, and persisted as
/// part of the strategy aggregate so triggers survive restarts. Exactly one
/// `Executing` instance may exist per asset at any time; the store's
/// compare-and-swap guard enforces this.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetStatus {
    /// Last observed price, if any quote has been seen.
    pub last_price: Option<Price>,
    /// When the last quote was observed.
    pub observed_at: Option<DateTime<Utc>>,
    /// Whether the take-profit condition currently holds.
    pub take_profit_hit: bool,
    /// Whether the stop-loss condition currently holds.
    pub stop_loss_hit: bool,
    /// Execution lifecycle for the current trigger instance.
    pub execution: ExecutionState,
    /// Ledger transaction id of the settlement, once submitted.
    pub execution_tx_id: Option<String>,
    /// Settlement amount credited on success.
    pub settlement_amount: Option<SettlementAmount>,
    /// Failure detail when `execution == Failed`.
    pub failure_reason: Option<String>,
}

impl AssetStatus {
    /// Whether this asset has a baseline observation to edge-trigger from.
    #[must_use]
    pub fn has_observation(&self) -> bool {
        self.last_price.is_some()
    }

    /// Folds a fresh market observation into this status.
    ///
    /// Only the observation half (price, timestamp, hit flags) is taken;
    /// the execution half stays as is. Observation writes race the
    /// execution guard, and a stale observation must never release it.
    pub fn merge_observation(&mut self, observation: &AssetStatus) {
        self.last_price = observation.last_price;
        self.observed_at = observation.observed_at;
        self.take_profit_hit = observation.take_profit_hit;
        self.stop_loss_hit = observation.stop_loss_hit;
    }
}
