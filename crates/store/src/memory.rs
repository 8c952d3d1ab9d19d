//! In-memory strategy store.

use crate::{ExecutionClaim, ExecutionOutcome, StoreError, StrategyStore};
use async_trait::async_trait;
use hodl_domain::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Process-local store. The single write lock makes the execution guard
/// atomic with respect to concurrent submitters in the same process.
#[derive(Clone, Default)]
pub struct MemoryStore {
    strategies: Arc<RwLock<HashMap<StrategyId, Strategy>>>,
    records: Arc<RwLock<Vec<ExecutionRecord>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StrategyStore for MemoryStore {
    async fn save(&self, strategy: &Strategy) -> Result<(), StoreError> {
        self.strategies
            .write()
            .await
            .insert(strategy.id, strategy.clone());
        Ok(())
    }

    async fn load(&self, id: StrategyId) -> Result<Option<Strategy>, StoreError> {
        Ok(self.strategies.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Strategy>, StoreError> {
        Ok(self.strategies.read().await.values().cloned().collect())
    }

    async fn delete(&self, id: StrategyId) -> Result<bool, StoreError> {
        Ok(self.strategies.write().await.remove(&id).is_some())
    }

    async fn update_status(
        &self,
        id: StrategyId,
        symbol: &str,
        status: &AssetStatus,
    ) -> Result<(), StoreError> {
        let mut strategies = self.strategies.write().await;
        if let Some(strategy) = strategies.get_mut(&id) {
            if strategy.asset(symbol).is_some() {
                let mut current = strategy.status(symbol);
                current.merge_observation(status);
                strategy.set_status(symbol, current);
            } else {
                // Asset removed while the evaluation ran; discard the result.
                debug!(symbol = %symbol, "discarding status for absent asset");
            }
        }
        Ok(())
    }

    async fn try_begin_execution(
        &self,
        id: StrategyId,
        symbol: &str,
    ) -> Result<ExecutionClaim, StoreError> {
        let mut strategies = self.strategies.write().await;
        let Some(strategy) = strategies.get_mut(&id) else {
            return Ok(ExecutionClaim::NotFound);
        };

        let mut status = strategy.status(symbol);
        match status.execution {
            ExecutionState::Executing => Ok(ExecutionClaim::InFlight),
            ExecutionState::Executed => Ok(ExecutionClaim::Settled),
            _ if strategy.asset(symbol).is_none() => Ok(ExecutionClaim::NotFound),
            _ => {
                status.execution = ExecutionState::Executing;
                strategy.set_status(symbol, status);
                Ok(ExecutionClaim::Claimed)
            }
        }
    }

    async fn finish_execution(
        &self,
        id: StrategyId,
        symbol: &str,
        outcome: ExecutionOutcome,
    ) -> Result<(), StoreError> {
        let mut strategies = self.strategies.write().await;
        let Some(strategy) = strategies.get_mut(&id) else {
            return Err(StoreError::NotFound(id));
        };

        let mut status = strategy.status(symbol);
        match outcome {
            ExecutionOutcome::Settled { tx_id, amount } => {
                status.execution = ExecutionState::Executed;
                status.execution_tx_id = Some(tx_id);
                status.settlement_amount = Some(amount);
                status.failure_reason = None;
                strategy.set_status(symbol, status);
                strategy.retire_asset(symbol);
            }
            ExecutionOutcome::Failed { reason } => {
                status.execution = ExecutionState::Failed;
                status.failure_reason = Some(reason);
                strategy.set_status(symbol, status);
            }
        }
        Ok(())
    }

    async fn append_record(&self, record: &ExecutionRecord) -> Result<(), StoreError> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn history(
        &self,
        id: StrategyId,
        symbol: &str,
    ) -> Result<Vec<ExecutionRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.strategy_id == id && r.symbol == symbol)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn strategy() -> Strategy {
        Strategy::new(
            "0xowner",
            RiskProfile::Moderate,
            false,
            false,
            vec![MonitoredAsset::new(
                "DOGE",
                "Dogecoin",
                dec!(1000),
                Price::new(dec!(0.062)),
                Thresholds::default(),
            )],
        )
    }

    #[tokio::test]
    async fn execution_guard_is_exclusive() {
        let store = MemoryStore::new();
        let s = strategy();
        store.save(&s).await.unwrap();

        assert_eq!(
            store.try_begin_execution(s.id, "DOGE").await.unwrap(),
            ExecutionClaim::Claimed
        );
        // Second claim while in flight is rejected.
        assert_eq!(
            store.try_begin_execution(s.id, "DOGE").await.unwrap(),
            ExecutionClaim::InFlight
        );
    }

    #[tokio::test]
    async fn observation_write_cannot_release_the_execution_guard() {
        let store = MemoryStore::new();
        let s = strategy();
        store.save(&s).await.unwrap();

        // A manual sell claims the guard and is still confirming.
        assert_eq!(
            store.try_begin_execution(s.id, "DOGE").await.unwrap(),
            ExecutionClaim::Claimed
        );

        // An evaluation pass that snapshotted the strategy before the claim
        // writes back a status that still says Idle.
        let stale = AssetStatus {
            last_price: Some(Price::new(dec!(0.05))),
            stop_loss_hit: true,
            execution: ExecutionState::Idle,
            ..AssetStatus::default()
        };
        store.update_status(s.id, "DOGE", &stale).await.unwrap();

        // The observation landed but the guard still holds.
        let loaded = store.load(s.id).await.unwrap().unwrap();
        assert_eq!(loaded.status("DOGE").last_price, Some(Price::new(dec!(0.05))));
        assert!(loaded.status("DOGE").stop_loss_hit);
        assert_eq!(loaded.status("DOGE").execution, ExecutionState::Executing);
        assert_eq!(
            store.try_begin_execution(s.id, "DOGE").await.unwrap(),
            ExecutionClaim::InFlight
        );
    }

    #[tokio::test]
    async fn failed_execution_can_be_reclaimed() {
        let store = MemoryStore::new();
        let s = strategy();
        store.save(&s).await.unwrap();

        store.try_begin_execution(s.id, "DOGE").await.unwrap();
        store
            .finish_execution(
                s.id,
                "DOGE",
                ExecutionOutcome::Failed {
                    reason: "ledger unreachable".into(),
                },
            )
            .await
            .unwrap();

        let loaded = store.load(s.id).await.unwrap().unwrap();
        assert_eq!(loaded.status("DOGE").execution, ExecutionState::Failed);
        assert!(loaded.asset("DOGE").is_some());

        assert_eq!(
            store.try_begin_execution(s.id, "DOGE").await.unwrap(),
            ExecutionClaim::Claimed
        );
    }

    #[tokio::test]
    async fn settled_asset_is_retired_but_remembered() {
        let store = MemoryStore::new();
        let s = strategy();
        store.save(&s).await.unwrap();

        store.try_begin_execution(s.id, "DOGE").await.unwrap();
        store
            .finish_execution(
                s.id,
                "DOGE",
                ExecutionOutcome::Settled {
                    tx_id: "0xtx".into(),
                    amount: SettlementAmount::from_minor_units(1_000_000),
                },
            )
            .await
            .unwrap();

        let loaded = store.load(s.id).await.unwrap().unwrap();
        assert!(loaded.asset("DOGE").is_none());
        assert_eq!(loaded.status("DOGE").execution, ExecutionState::Executed);

        // Later claims observe the settled state.
        assert_eq!(
            store.try_begin_execution(s.id, "DOGE").await.unwrap(),
            ExecutionClaim::Settled
        );
    }

    #[tokio::test]
    async fn finish_against_deleted_strategy_is_discarded() {
        let store = MemoryStore::new();
        let s = strategy();
        store.save(&s).await.unwrap();
        store.try_begin_execution(s.id, "DOGE").await.unwrap();
        store.delete(s.id).await.unwrap();

        let result = store
            .finish_execution(
                s.id,
                "DOGE",
                ExecutionOutcome::Settled {
                    tx_id: "0xtx".into(),
                    amount: SettlementAmount::from_minor_units(1),
                },
            )
            .await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }
}
