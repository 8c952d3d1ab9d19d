//! Strategy command surface.
//!
//! The operations a user (via API or CLI) performs against the engine:
//! deploy, edit, delete, sell now, inspect history. Deployment snapshots
//! current quotes to fix each asset's entry price and derive its targets.

use crate::coordinator::ExecutionCoordinator;
use crate::events::EventBus;
use crate::targets::{resolve_multipliers, thresholds_from};
use hodl_clients::{AdvisoryClient, PriceFeed, Quote};
use hodl_domain::prelude::*;
use hodl_store::StrategyStore;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::info;

/// An asset to put under monitoring.
#[derive(Debug, Clone)]
pub struct NewAsset {
    pub symbol: String,
    pub quantity: Decimal,
}

/// Deployment command.
#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub owner_address: String,
    pub risk_profile: RiskProfile,
    pub ai_take_profit: bool,
    pub ai_stop_loss: bool,
    pub assets: Vec<NewAsset>,
}

/// Replacement thresholds for one asset.
#[derive(Debug, Clone)]
pub struct ThresholdPatch {
    pub symbol: String,
    pub take_profit: Option<Price>,
    pub stop_loss: Option<Price>,
}

/// Partial strategy edit. Unset fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct StrategyPatch {
    pub risk_profile: Option<RiskProfile>,
    pub toggles: Option<TriggerToggles>,
    pub thresholds: Vec<ThresholdPatch>,
    pub remove_assets: Vec<String>,
}

/// Front door for strategy lifecycle operations.
pub struct StrategyService {
    store: Arc<dyn StrategyStore>,
    feed: Arc<dyn PriceFeed>,
    advisory: Option<Arc<dyn AdvisoryClient>>,
    coordinator: Arc<ExecutionCoordinator>,
    events: EventBus,
}

impl StrategyService {
    #[must_use]
    pub fn new(
        store: Arc<dyn StrategyStore>,
        feed: Arc<dyn PriceFeed>,
        advisory: Option<Arc<dyn AdvisoryClient>>,
        coordinator: Arc<ExecutionCoordinator>,
        events: EventBus,
    ) -> Self {
        Self {
            store,
            feed,
            advisory,
            coordinator,
            events,
        }
    }

    /// Deploys a new strategy.
    ///
    /// Fetches a quote for every requested asset; the quote's price becomes
    /// the entry price and both targets are derived from it. A symbol the
    /// feed does not know is rejected, not silently skipped.
    ///
    /// # Errors
    /// [`EngineError::InvalidRequest`] for non-positive quantities or a
    /// symbol listed twice, [`EngineError::FeedUnavailable`] when quotes
    /// cannot be fetched and [`EngineError::AssetNotFound`] for unknown
    /// symbols.
    pub async fn deploy_strategy(&self, request: DeployRequest) -> Result<Strategy, EngineError> {
        let mut seen = HashSet::new();
        for spec in &request.assets {
            if spec.quantity <= Decimal::ZERO {
                return Err(EngineError::InvalidRequest(format!(
                    "quantity for {} must be positive",
                    spec.symbol
                )));
            }
            // The statuses map is keyed by symbol; a duplicate would let
            // one sale mark both positions settled.
            if !seen.insert(spec.symbol.clone()) {
                return Err(EngineError::InvalidRequest(format!(
                    "duplicate asset {}",
                    spec.symbol
                )));
            }
        }

        let symbols: Vec<String> = request.assets.iter().map(|a| a.symbol.clone()).collect();
        let quotes = self.feed.quotes(&symbols).await?;

        let mut assets = Vec::with_capacity(request.assets.len());
        for spec in &request.assets {
            let quote = quotes
                .get(&spec.symbol)
                .ok_or_else(|| EngineError::AssetNotFound(spec.symbol.clone()))?;

            let multipliers = resolve_multipliers(
                self.advisory.as_deref(),
                request.risk_profile,
                request.ai_take_profit,
                request.ai_stop_loss,
                quote,
                &self.events,
            )
            .await;

            assets.push(MonitoredAsset::new(
                spec.symbol.clone(),
                quote.name.clone(),
                spec.quantity,
                quote.price,
                thresholds_from(quote.price, multipliers),
            ));
        }

        let strategy = Strategy::new(
            request.owner_address,
            request.risk_profile,
            request.ai_take_profit,
            request.ai_stop_loss,
            assets,
        );
        self.store.save(&strategy).await?;
        info!(
            strategy_id = %strategy.id,
            profile = %strategy.risk_profile.as_str(),
            assets = strategy.assets.len(),
            "strategy deployed"
        );
        Ok(strategy)
    }

    /// Applies a partial edit and persists the result.
    ///
    /// # Errors
    /// [`EngineError::StrategyNotFound`] for unknown ids and
    /// [`EngineError::AssetNotFound`] when a patch names an absent symbol.
    pub async fn edit_strategy(
        &self,
        id: StrategyId,
        patch: StrategyPatch,
    ) -> Result<Strategy, EngineError> {
        let mut strategy = self
            .store
            .load(id)
            .await?
            .ok_or(EngineError::StrategyNotFound(id))?;

        if let Some(profile) = patch.risk_profile {
            strategy.risk_profile = profile;
        }
        if let Some(toggles) = patch.toggles {
            strategy.toggles = toggles;
        }
        for threshold in &patch.thresholds {
            let asset = strategy
                .assets
                .iter_mut()
                .find(|a| a.symbol == threshold.symbol)
                .ok_or_else(|| EngineError::AssetNotFound(threshold.symbol.clone()))?;
            asset.thresholds = Thresholds::new(threshold.take_profit, threshold.stop_loss);
        }
        for symbol in &patch.remove_assets {
            if strategy.remove_asset(symbol).is_none() {
                return Err(EngineError::AssetNotFound(symbol.clone()));
            }
        }

        self.store.save(&strategy).await?;
        info!(strategy_id = %id, "strategy updated");
        Ok(strategy)
    }

    /// Deletes a strategy. Pending evaluations for its assets are dropped
    /// by the store-level discard rules.
    ///
    /// # Errors
    /// [`EngineError::StrategyNotFound`] when the id is unknown.
    pub async fn delete_strategy(&self, id: StrategyId) -> Result<(), EngineError> {
        if !self.store.delete(id).await? {
            return Err(EngineError::StrategyNotFound(id));
        }
        info!(strategy_id = %id, "strategy deleted");
        Ok(())
    }

    /// Loads one strategy.
    pub async fn strategy(&self, id: StrategyId) -> Result<Strategy, EngineError> {
        self.store
            .load(id)
            .await?
            .ok_or(EngineError::StrategyNotFound(id))
    }

    /// Lists all strategies.
    pub async fn strategies(&self) -> Result<Vec<Strategy>, EngineError> {
        Ok(self.store.list().await?)
    }

    /// Manually sells one asset now, through the same guard as automatic
    /// triggers.
    pub async fn sell_now(
        &self,
        id: StrategyId,
        symbol: &str,
    ) -> Result<ExecutionRecord, EngineError> {
        self.coordinator.submit(id, symbol, TriggerReason::Manual).await
    }

    /// Append-only execution history for one asset.
    pub async fn history(
        &self,
        id: StrategyId,
        symbol: &str,
    ) -> Result<Vec<ExecutionRecord>, EngineError> {
        Ok(self.store.history(id, symbol).await?)
    }

    /// Current quotes for arbitrary symbols (watchlist support).
    pub async fn quotes(&self, symbols: &[String]) -> Result<HashMap<String, Quote>, EngineError> {
        self.feed.quotes(symbols).await
    }
}
