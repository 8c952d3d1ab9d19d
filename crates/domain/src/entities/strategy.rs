use crate::entities::MonitoredAsset;
use crate::enums::RiskProfile;
use crate::status::AssetStatus;
use crate::value_objects::TriggerToggles;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Identifier of a deployed strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StrategyId(pub Uuid);

impl StrategyId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for StrategyId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Aggregate root for one user's automated sell strategy.
///
/// The persisted aggregate is the single source of truth for what should be
/// monitored. All mutation is whole-aggregate replace through the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub id: StrategyId,
    /// Owner's ledger address; settlement is credited here.
    pub owner_address: String,
    pub risk_profile: RiskProfile,
    /// Whether take-profit targets are sourced from the advisory client.
    pub ai_take_profit: bool,
    /// Whether stop-loss targets are sourced from the advisory client.
    pub ai_stop_loss: bool,
    /// Per-side trigger switches.
    pub toggles: TriggerToggles,
    /// Assets under monitoring, in deployment order.
    pub assets: Vec<MonitoredAsset>,
    /// Durable per-asset trigger status, keyed by symbol.
    pub statuses: HashMap<String, AssetStatus>,
    pub created_at: DateTime<Utc>,
}

impl Strategy {
    pub fn new(
        owner_address: impl Into<String>,
        risk_profile: RiskProfile,
        ai_take_profit: bool,
        ai_stop_loss: bool,
        assets: Vec<MonitoredAsset>,
    ) -> Self {
        let statuses = assets
            .iter()
            .map(|a| (a.symbol.clone(), AssetStatus::default()))
            .collect();
        Self {
            id: StrategyId::new(),
            owner_address: owner_address.into(),
            risk_profile,
            ai_take_profit,
            ai_stop_loss,
            toggles: TriggerToggles::default(),
            assets,
            statuses,
            created_at: Utc::now(),
        }
    }

    /// Looks up an asset by symbol.
    #[must_use]
    pub fn asset(&self, symbol: &str) -> Option<&MonitoredAsset> {
        self.assets.iter().find(|a| a.symbol == symbol)
    }

    /// Current status for a symbol, defaulting to an unobserved status.
    #[must_use]
    pub fn status(&self, symbol: &str) -> AssetStatus {
        self.statuses.get(symbol).cloned().unwrap_or_default()
    }

    /// Replaces the status for a symbol.
    pub fn set_status(&mut self, symbol: &str, status: AssetStatus) {
        self.statuses.insert(symbol.to_string(), status);
    }

    /// Removes an asset (and its status) from the monitored set.
    ///
    /// Returns the removed asset, if it was present.
    pub fn remove_asset(&mut self, symbol: &str) -> Option<MonitoredAsset> {
        let idx = self.assets.iter().position(|a| a.symbol == symbol)?;
        self.statuses.remove(symbol);
        Some(self.assets.remove(idx))
    }

    /// Retires a sold asset: drops it from the monitored set but keeps its
    /// status so later submissions can be rejected as already settled.
    pub fn retire_asset(&mut self, symbol: &str) -> Option<MonitoredAsset> {
        let idx = self.assets.iter().position(|a| a.symbol == symbol)?;
        Some(self.assets.remove(idx))
    }

    /// Symbols currently under monitoring.
    #[must_use]
    pub fn symbols(&self) -> Vec<String> {
        self.assets.iter().map(|a| a.symbol.clone()).collect()
    }
}
