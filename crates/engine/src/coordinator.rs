//! Execution coordinator.
//!
//! All executions, automatic and manual, pass through [`ExecutionCoordinator::submit`].
//! The store's conditional claim is the single mutual-exclusion primitive:
//! at most one in-flight execution exists per asset, across every engine
//! instance sharing the store. Outcomes for strategies deleted mid-flight
//! are discarded, never written back.

use crate::events::{EngineEvent, EventBus, explorer_url};
use crate::settlement::SettlementExecutor;
use hodl_clients::AccountAddress;
use hodl_domain::prelude::*;
use hodl_store::{ExecutionClaim, ExecutionOutcome, StoreError, StrategyStore};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Serializes executions per symbol and records their outcomes.
pub struct ExecutionCoordinator {
    store: Arc<dyn StrategyStore>,
    settlement: SettlementExecutor,
    events: EventBus,
    network: String,
}

impl ExecutionCoordinator {
    #[must_use]
    pub fn new(
        store: Arc<dyn StrategyStore>,
        settlement: SettlementExecutor,
        events: EventBus,
        network: impl Into<String>,
    ) -> Self {
        Self {
            store,
            settlement,
            events,
            network: network.into(),
        }
    }

    /// Executes a sell for one asset.
    ///
    /// Claims the per-symbol guard, settles on the ledger at the last
    /// observed price, records the outcome, and appends an immutable
    /// execution record. On failure the asset returns to `Failed` and
    /// stays monitored for retry.
    ///
    /// # Errors
    /// - [`EngineError::AlreadyExecuting`] while another execution for the
    ///   symbol is in flight. No state changes, no record is appended.
    /// - [`EngineError::AlreadySettled`] when the asset was already sold.
    /// - Settlement errors propagate after the failure is recorded.
    pub async fn submit(
        &self,
        strategy_id: StrategyId,
        symbol: &str,
        reason: TriggerReason,
    ) -> Result<ExecutionRecord, EngineError> {
        match self.store.try_begin_execution(strategy_id, symbol).await? {
            ExecutionClaim::Claimed => {}
            ExecutionClaim::InFlight => {
                debug!(symbol = %symbol, "submit rejected, execution in flight");
                return Err(EngineError::AlreadyExecuting {
                    symbol: symbol.to_string(),
                });
            }
            ExecutionClaim::Settled => {
                debug!(symbol = %symbol, "submit rejected, already settled");
                return Err(EngineError::AlreadySettled {
                    symbol: symbol.to_string(),
                });
            }
            ExecutionClaim::NotFound => {
                return match self.store.load(strategy_id).await? {
                    Some(_) => Err(EngineError::AssetNotFound(symbol.to_string())),
                    None => Err(EngineError::StrategyNotFound(strategy_id)),
                };
            }
        }

        // Guard is held from here on; every path must report an outcome.
        let strategy = match self.store.load(strategy_id).await? {
            Some(strategy) => strategy,
            None => {
                warn!(strategy_id = %strategy_id, "strategy vanished after claim");
                return Err(EngineError::StrategyNotFound(strategy_id));
            }
        };
        let Some(asset) = strategy.asset(symbol) else {
            self.release_guard(strategy_id, symbol, "asset removed after claim")
                .await;
            return Err(EngineError::AssetNotFound(symbol.to_string()));
        };

        // Execution price is the last observed quote, or the entry price if
        // the asset was never quoted (manual sell before the first cycle).
        let status = strategy.status(symbol);
        let execution_price = status.last_price.unwrap_or(asset.entry_price);
        let quantity = asset.quantity;
        let owner = AccountAddress::new(strategy.owner_address.clone());

        info!(
            strategy_id = %strategy_id,
            symbol = %symbol,
            reason = %reason.as_str(),
            price = %execution_price,
            quantity = %quantity,
            "executing sell"
        );

        match self
            .settlement
            .execute(&owner, symbol, quantity, execution_price)
            .await
        {
            Ok((tx_id, amount)) => {
                let outcome = ExecutionOutcome::Settled {
                    tx_id: tx_id.clone(),
                    amount,
                };
                if let Err(StoreError::NotFound(_)) = self
                    .store
                    .finish_execution(strategy_id, symbol, outcome)
                    .await
                {
                    // Strategy deleted while the settlement was confirming;
                    // the result is dropped rather than resurrecting state.
                    warn!(strategy_id = %strategy_id, symbol = %symbol, tx_id = %tx_id, "discarding settlement for deleted strategy");
                    return Err(EngineError::StrategyNotFound(strategy_id));
                }

                let record = ExecutionRecord::settled(
                    strategy_id,
                    symbol,
                    reason,
                    quantity,
                    execution_price,
                    amount,
                    tx_id.clone(),
                );
                self.store.append_record(&record).await?;
                self.events.emit(EngineEvent::ExecutionCompleted {
                    strategy_id,
                    symbol: symbol.to_string(),
                    reason,
                    record_id: record.id,
                    tx_id: tx_id.clone(),
                    amount,
                    explorer_url: explorer_url(&self.network, &tx_id),
                });
                Ok(record)
            }
            Err(err) => {
                error!(symbol = %symbol, error = %err, "settlement failed");
                let outcome = ExecutionOutcome::Failed {
                    reason: err.to_string(),
                };
                if let Err(finish_err) = self
                    .store
                    .finish_execution(strategy_id, symbol, outcome)
                    .await
                {
                    warn!(symbol = %symbol, error = %finish_err, "could not record failure outcome");
                }

                // The record keeps the would-be amount; zero when the trade
                // itself was unsettleable.
                let would_be_amount = SettlementAmount::from_trade(quantity, execution_price.value)
                    .unwrap_or(SettlementAmount::from_minor_units(0));
                let record = ExecutionRecord::failed(
                    strategy_id,
                    symbol,
                    reason,
                    quantity,
                    execution_price,
                    would_be_amount,
                    err.to_string(),
                );
                self.store.append_record(&record).await?;
                self.events.emit(EngineEvent::ExecutionFailed {
                    strategy_id,
                    symbol: symbol.to_string(),
                    reason,
                    error: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Returns a claimed symbol to `Failed` when execution cannot proceed.
    async fn release_guard(&self, strategy_id: StrategyId, symbol: &str, reason: &str) {
        let outcome = ExecutionOutcome::Failed {
            reason: reason.to_string(),
        };
        if let Err(err) = self
            .store
            .finish_execution(strategy_id, symbol, outcome)
            .await
        {
            warn!(symbol = %symbol, error = %err, "could not release execution guard");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settlement::{SettlementConfig, SettlementExecutor};
    use hodl_clients::{DevnetLedger, SigningKey};
    use hodl_store::MemoryStore;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn coordinator(
        store: Arc<MemoryStore>,
        ledger: Arc<DevnetLedger>,
    ) -> ExecutionCoordinator {
        let settlement = SettlementExecutor::new(
            ledger,
            SettlementConfig {
                vendor_key: Some(SigningKey::new(AccountAddress::new("0xvendor"), "vsecret")),
                confirmation_timeout: Duration::from_secs(1),
                ..SettlementConfig::default()
            },
        );
        ExecutionCoordinator::new(store, settlement, EventBus::new(), "devnet")
    }

    fn ledger() -> Arc<DevnetLedger> {
        Arc::new(
            DevnetLedger::new(AccountAddress::new("0xvendor"))
                .with_confirmation_delay(Duration::from_millis(1)),
        )
    }

    async fn deployed(store: &MemoryStore) -> Strategy {
        let strategy = Strategy::new(
            "0xowner",
            RiskProfile::Moderate,
            false,
            false,
            vec![MonitoredAsset::new(
                "DOGE",
                "Dogecoin",
                dec!(50),
                Price::new(dec!(0.02)),
                Thresholds::default(),
            )],
        );
        store.save(&strategy).await.unwrap();
        strategy
    }

    #[tokio::test]
    async fn successful_submit_settles_and_records() {
        let store = Arc::new(MemoryStore::new());
        let coordinator = coordinator(store.clone(), ledger());
        let strategy = deployed(&store).await;

        let record = coordinator
            .submit(strategy.id, "DOGE", TriggerReason::Manual)
            .await
            .unwrap();
        assert!(record.success);
        assert_eq!(record.settlement_amount.minor_units, 1_000_000);

        let loaded = store.load(strategy.id).await.unwrap().unwrap();
        assert!(loaded.asset("DOGE").is_none());
        assert_eq!(loaded.status("DOGE").execution, ExecutionState::Executed);
        assert_eq!(store.history(strategy.id, "DOGE").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn second_submit_after_settlement_is_already_settled() {
        let store = Arc::new(MemoryStore::new());
        let coordinator = coordinator(store.clone(), ledger());
        let strategy = deployed(&store).await;

        coordinator
            .submit(strategy.id, "DOGE", TriggerReason::Manual)
            .await
            .unwrap();
        let err = coordinator
            .submit(strategy.id, "DOGE", TriggerReason::Manual)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::AlreadySettled { .. }));
        // The rejection leaves no extra record behind.
        assert_eq!(store.history(strategy.id, "DOGE").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_submits_let_exactly_one_through() {
        let store = Arc::new(MemoryStore::new());
        let coordinator = Arc::new(coordinator(store.clone(), ledger()));
        let strategy = deployed(&store).await;

        let a = {
            let c = coordinator.clone();
            let id = strategy.id;
            tokio::spawn(async move { c.submit(id, "DOGE", TriggerReason::TakeProfit).await })
        };
        let b = {
            let c = coordinator.clone();
            let id = strategy.id;
            tokio::spawn(async move { c.submit(id, "DOGE", TriggerReason::StopLoss).await })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let successes = results.iter().filter(|r| r.is_ok()).count();
        let rejections = results
            .iter()
            .filter(|r| matches!(r, Err(e) if e.is_rejection()))
            .count();
        assert_eq!(successes, 1);
        assert_eq!(rejections, 1);
        assert_eq!(store.history(strategy.id, "DOGE").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_settlement_records_and_allows_retry() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger();
        let coordinator = coordinator(store.clone(), ledger.clone());
        let strategy = deployed(&store).await;

        ledger.fail_next_submission("sequence number too old").await;
        let err = coordinator
            .submit(strategy.id, "DOGE", TriggerReason::StopLoss)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::SettlementFailed(_)));

        let loaded = store.load(strategy.id).await.unwrap().unwrap();
        assert_eq!(loaded.status("DOGE").execution, ExecutionState::Failed);
        assert!(loaded.asset("DOGE").is_some());

        // Retry succeeds once the ledger recovers.
        let record = coordinator
            .submit(strategy.id, "DOGE", TriggerReason::StopLoss)
            .await
            .unwrap();
        assert!(record.success);

        let history = store.history(strategy.id, "DOGE").await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(!history[0].success);
        assert!(history[1].success);
    }

    #[tokio::test]
    async fn unknown_symbol_is_asset_not_found() {
        let store = Arc::new(MemoryStore::new());
        let coordinator = coordinator(store.clone(), ledger());
        let strategy = deployed(&store).await;

        let err = coordinator
            .submit(strategy.id, "SHIB", TriggerReason::Manual)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::AssetNotFound(_)));
    }

    #[tokio::test]
    async fn unknown_strategy_is_strategy_not_found() {
        let store = Arc::new(MemoryStore::new());
        let coordinator = coordinator(store.clone(), ledger());

        let err = coordinator
            .submit(StrategyId::new(), "DOGE", TriggerReason::Manual)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::StrategyNotFound(_)));
    }
}
