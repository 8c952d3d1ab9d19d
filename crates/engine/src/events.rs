//! Engine event bus.
//!
//! Observers (API pushers, the CLI, alerting) subscribe to a broadcast
//! channel. Emission never blocks and never fails: with no subscribers the
//! event is simply dropped.

use hodl_domain::prelude::*;
use tokio::sync::broadcast;
use uuid::Uuid;

const DEFAULT_CAPACITY: usize = 256;
const EXPLORER_BASE: &str = "https://explorer.aptoslabs.com/txn";

/// User-facing explorer link for a settlement transaction.
#[must_use]
pub fn explorer_url(network: &str, tx_id: &str) -> String {
    format!("{EXPLORER_BASE}/{tx_id}?network={network}")
}

/// Events emitted by the engine as triggers fire and settle.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// A threshold crossing was detected.
    TriggerFired {
        strategy_id: StrategyId,
        symbol: String,
        reason: TriggerReason,
        price: Price,
    },
    /// A settlement confirmed.
    ExecutionCompleted {
        strategy_id: StrategyId,
        symbol: String,
        reason: TriggerReason,
        record_id: Uuid,
        tx_id: String,
        amount: SettlementAmount,
        explorer_url: String,
    },
    /// A settlement attempt failed; the asset stays monitored for retry.
    ExecutionFailed {
        strategy_id: StrategyId,
        symbol: String,
        reason: TriggerReason,
        error: String,
    },
    /// The advisory answered with something unusable; static multipliers
    /// were used instead. Emitted so advisory-quality degradation can be
    /// alerted on.
    AdvisoryRejected {
        strategy_id: Option<StrategyId>,
        symbol: String,
        detail: String,
    },
}

/// Broadcast fan-out for [`EngineEvent`]s.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(DEFAULT_CAPACITY);
        Self { sender }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.sender.subscribe()
    }

    /// Emits an event to all current subscribers.
    pub fn emit(&self, event: EngineEvent) {
        // An empty subscriber set is not an error.
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn explorer_link_embeds_network() {
        let url = explorer_url("devnet", "0xabc123");
        assert_eq!(url, "https://explorer.aptoslabs.com/txn/0xabc123?network=devnet");
    }

    #[tokio::test]
    async fn subscribers_receive_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.emit(EngineEvent::TriggerFired {
            strategy_id: StrategyId::new(),
            symbol: "DOGE".into(),
            reason: TriggerReason::StopLoss,
            price: Price::new(dec!(0.05)),
        });

        match rx.recv().await.unwrap() {
            EngineEvent::TriggerFired { symbol, reason, .. } => {
                assert_eq!(symbol, "DOGE");
                assert_eq!(reason, TriggerReason::StopLoss);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn emit_without_subscribers_is_a_no_op() {
        let bus = EventBus::new();
        bus.emit(EngineEvent::AdvisoryRejected {
            strategy_id: None,
            symbol: "PEPE".into(),
            detail: "not json".into(),
        });
    }
}
