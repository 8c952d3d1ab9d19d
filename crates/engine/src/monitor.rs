//! Periodic evaluation loop.
//!
//! One task drives all monitored assets. Each tick takes a fresh snapshot
//! of every strategy, fetches quotes in one batch, evaluates each asset
//! against its thresholds, persists the new status, and submits any
//! transitions to the coordinator. Submits run as their own tasks; the
//! store guard serializes per symbol, so a slow confirmation never holds
//! up the rest of the pass. A feed outage skips the cycle and retains the
//! last known status; a symbol missing from the quote batch is simply not
//! observed this cycle.

use crate::coordinator::ExecutionCoordinator;
use crate::evaluator::evaluate;
use crate::events::{EngineEvent, EventBus};
use hodl_clients::PriceFeed;
use hodl_domain::prelude::*;
use hodl_store::StrategyStore;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Monitor settings.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Evaluation interval.
    pub interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
        }
    }
}

/// Drives trigger evaluation on a fixed interval.
pub struct TriggerMonitor {
    store: Arc<dyn StrategyStore>,
    feed: Arc<dyn PriceFeed>,
    coordinator: Arc<ExecutionCoordinator>,
    events: EventBus,
    config: MonitorConfig,
    running: Arc<AtomicBool>,
}

impl TriggerMonitor {
    #[must_use]
    pub fn new(
        store: Arc<dyn StrategyStore>,
        feed: Arc<dyn PriceFeed>,
        coordinator: Arc<ExecutionCoordinator>,
        events: EventBus,
        config: MonitorConfig,
    ) -> Self {
        Self {
            store,
            feed,
            coordinator,
            events,
            config,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Runs the evaluation loop until [`TriggerMonitor::stop`] is called.
    pub async fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
        info!(interval_secs = self.config.interval.as_secs(), "trigger monitor started");

        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        while self.running.load(Ordering::SeqCst) {
            ticker.tick().await;
            if !self.running.load(Ordering::SeqCst) {
                break;
            }
            if let Err(err) = self.run_cycle().await {
                // Feed outages are expected; keep the last known status.
                warn!(error = %err, "evaluation cycle skipped");
            }
        }
        info!("trigger monitor stopped");
    }

    /// Stops the loop after the current cycle.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Evaluates every monitored asset once. Returns after every execution
    /// spawned by this pass has finished.
    ///
    /// # Errors
    /// Returns [`EngineError::FeedUnavailable`] when the quote batch could
    /// not be fetched; no state is mutated in that case.
    pub async fn run_cycle(&self) -> Result<(), EngineError> {
        let strategies = self.store.list().await.map_err(EngineError::from)?;
        let symbols: Vec<String> = strategies
            .iter()
            .flat_map(Strategy::symbols)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        if symbols.is_empty() {
            return Ok(());
        }

        let quotes = self.feed.quotes(&symbols).await?;

        let mut submits = Vec::new();
        for strategy in &strategies {
            for asset in &strategy.assets {
                let Some(quote) = quotes.get(&asset.symbol) else {
                    debug!(symbol = %asset.symbol, "no observation this cycle");
                    continue;
                };

                let previous = strategy.status(&asset.symbol);
                let evaluation = evaluate(
                    &previous,
                    &asset.symbol,
                    quote.price,
                    quote.as_of,
                    &asset.thresholds,
                    strategy.toggles,
                );
                self.store
                    .update_status(strategy.id, &asset.symbol, &evaluation.status)
                    .await
                    .map_err(EngineError::from)?;

                for transition in evaluation.transitions {
                    self.events.emit(EngineEvent::TriggerFired {
                        strategy_id: strategy.id,
                        symbol: transition.symbol.clone(),
                        reason: transition.reason,
                        price: transition.price,
                    });

                    let coordinator = self.coordinator.clone();
                    let strategy_id = strategy.id;
                    submits.push(tokio::spawn(async move {
                        match coordinator
                            .submit(strategy_id, &transition.symbol, transition.reason)
                            .await
                        {
                            Ok(record) => {
                                info!(
                                    symbol = %transition.symbol,
                                    reason = %transition.reason.as_str(),
                                    amount = %record.settlement_amount,
                                    "trigger executed"
                                );
                            }
                            Err(err) if err.is_rejection() => {
                                // A manual sell or the other trigger side won
                                // the guard; nothing to do.
                                debug!(symbol = %transition.symbol, error = %err, "trigger lost the guard");
                            }
                            Err(err) => {
                                warn!(symbol = %transition.symbol, error = %err, "trigger execution failed");
                            }
                        }
                    }));
                }
            }
        }

        for submit in submits {
            if submit.await.is_err() {
                warn!("execution task aborted");
            }
        }
        Ok(())
    }
}
