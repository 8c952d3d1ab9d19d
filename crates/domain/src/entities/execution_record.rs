use crate::entities::StrategyId;
use crate::enums::TriggerReason;
use crate::value_objects::{Price, SettlementAmount};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable fact recording one execution attempt.
///
/// Appended once per successful or failed attempt and never mutated; the
/// per-asset history is append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub id: Uuid,
    pub strategy_id: StrategyId,
    pub symbol: String,
    pub reason: TriggerReason,
    pub quantity: Decimal,
    pub execution_price: Price,
    pub settlement_amount: SettlementAmount,
    /// Ledger transaction id; absent when submission itself failed.
    pub tx_id: Option<String>,
    pub success: bool,
    /// Failure detail for unsuccessful attempts.
    pub error: Option<String>,
    pub executed_at: DateTime<Utc>,
}

impl ExecutionRecord {
    /// Record for a confirmed settlement.
    #[must_use]
    pub fn settled(
        strategy_id: StrategyId,
        symbol: impl Into<String>,
        reason: TriggerReason,
        quantity: Decimal,
        execution_price: Price,
        settlement_amount: SettlementAmount,
        tx_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            strategy_id,
            symbol: symbol.into(),
            reason,
            quantity,
            execution_price,
            settlement_amount,
            tx_id: Some(tx_id.into()),
            success: true,
            error: None,
            executed_at: Utc::now(),
        }
    }

    /// Record for a failed attempt.
    #[must_use]
    pub fn failed(
        strategy_id: StrategyId,
        symbol: impl Into<String>,
        reason: TriggerReason,
        quantity: Decimal,
        execution_price: Price,
        settlement_amount: SettlementAmount,
        error: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            strategy_id,
            symbol: symbol.into(),
            reason,
            quantity,
            execution_price,
            settlement_amount,
            tx_id: None,
            success: false,
            error: Some(error.into()),
            executed_at: Utc::now(),
        }
    }
}
