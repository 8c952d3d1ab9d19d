//! Request and response models.
//!
//! Wire types are separate from domain types so the JSON shapes can stay
//! stable while the domain evolves. Prices and quantities serialize as
//! decimal strings via `rust_decimal`'s serde support.

use chrono::{DateTime, Utc};
use hodl_clients::Quote;
use hodl_domain::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct NewAssetRequest {
    pub symbol: String,
    pub quantity: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct DeployStrategyRequest {
    pub owner_address: String,
    pub risk_profile: RiskProfile,
    #[serde(default)]
    pub ai_take_profit: bool,
    #[serde(default)]
    pub ai_stop_loss: bool,
    pub assets: Vec<NewAssetRequest>,
}

#[derive(Debug, Deserialize)]
pub struct ThresholdPatchRequest {
    pub symbol: String,
    pub take_profit: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EditStrategyRequest {
    pub risk_profile: Option<RiskProfile>,
    pub toggles: Option<TriggerToggles>,
    #[serde(default)]
    pub thresholds: Vec<ThresholdPatchRequest>,
    #[serde(default)]
    pub remove_assets: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AssetStatusView {
    pub last_price: Option<Decimal>,
    pub observed_at: Option<DateTime<Utc>>,
    pub take_profit_hit: bool,
    pub stop_loss_hit: bool,
    pub execution: ExecutionState,
    pub tx_id: Option<String>,
    pub settlement_amount: Option<Decimal>,
    pub failure_reason: Option<String>,
}

impl From<AssetStatus> for AssetStatusView {
    fn from(status: AssetStatus) -> Self {
        Self {
            last_price: status.last_price.map(|p| p.value),
            observed_at: status.observed_at,
            take_profit_hit: status.take_profit_hit,
            stop_loss_hit: status.stop_loss_hit,
            execution: status.execution,
            tx_id: status.execution_tx_id,
            settlement_amount: status.settlement_amount.map(|a| a.to_decimal()),
            failure_reason: status.failure_reason,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AssetView {
    pub symbol: String,
    pub name: String,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub take_profit: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub status: AssetStatusView,
}

#[derive(Debug, Serialize)]
pub struct StrategyView {
    pub id: Uuid,
    pub owner_address: String,
    pub risk_profile: RiskProfile,
    pub ai_take_profit: bool,
    pub ai_stop_loss: bool,
    pub toggles: TriggerToggles,
    pub assets: Vec<AssetView>,
    pub created_at: DateTime<Utc>,
}

impl From<Strategy> for StrategyView {
    fn from(strategy: Strategy) -> Self {
        let assets = strategy
            .assets
            .iter()
            .map(|asset| AssetView {
                symbol: asset.symbol.clone(),
                name: asset.name.clone(),
                quantity: asset.quantity,
                entry_price: asset.entry_price.value,
                take_profit: asset.thresholds.take_profit.map(|p| p.value),
                stop_loss: asset.thresholds.stop_loss.map(|p| p.value),
                status: strategy.status(&asset.symbol).into(),
            })
            .collect();
        Self {
            id: strategy.id.0,
            owner_address: strategy.owner_address,
            risk_profile: strategy.risk_profile,
            ai_take_profit: strategy.ai_take_profit,
            ai_stop_loss: strategy.ai_stop_loss,
            toggles: strategy.toggles,
            assets,
            created_at: strategy.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExecutionRecordView {
    pub id: Uuid,
    pub symbol: String,
    pub reason: TriggerReason,
    pub quantity: Decimal,
    pub execution_price: Decimal,
    pub settlement_amount: Decimal,
    pub tx_id: Option<String>,
    pub success: bool,
    pub error: Option<String>,
    pub executed_at: DateTime<Utc>,
}

impl From<ExecutionRecord> for ExecutionRecordView {
    fn from(record: ExecutionRecord) -> Self {
        Self {
            id: record.id,
            symbol: record.symbol,
            reason: record.reason,
            quantity: record.quantity,
            execution_price: record.execution_price.value,
            settlement_amount: record.settlement_amount.to_decimal(),
            tx_id: record.tx_id,
            success: record.success,
            error: record.error,
            executed_at: record.executed_at,
        }
    }
}

/// Sell response, with a user-facing explorer link when settled on-ledger.
#[derive(Debug, Serialize)]
pub struct SellResponse {
    #[serde(flatten)]
    pub record: ExecutionRecordView,
    pub explorer_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QuoteView {
    pub symbol: String,
    pub name: String,
    pub price: Decimal,
    pub change_24h: Decimal,
    pub market_cap: Decimal,
    pub volume_24h: Decimal,
    pub risk: String,
    pub as_of: DateTime<Utc>,
}

impl From<Quote> for QuoteView {
    fn from(quote: Quote) -> Self {
        Self {
            symbol: quote.symbol,
            name: quote.name,
            price: quote.price.value,
            change_24h: quote.change_24h,
            market_cap: quote.market_cap,
            volume_24h: quote.volume_24h,
            risk: quote.risk.as_str().to_string(),
            as_of: quote.as_of,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn deploy_request_parses_with_defaults() {
        let body = r#"{
            "owner_address": "0xowner",
            "risk_profile": "moderate",
            "assets": [{ "symbol": "DOGE", "quantity": "1000" }]
        }"#;
        let request: DeployStrategyRequest = serde_json::from_str(body).unwrap();
        assert!(!request.ai_take_profit);
        assert!(!request.ai_stop_loss);
        assert_eq!(request.assets[0].quantity, dec!(1000));
    }

    #[test]
    fn strategy_view_includes_status() {
        let mut strategy = Strategy::new(
            "0xowner",
            RiskProfile::Aggressive,
            false,
            false,
            vec![MonitoredAsset::new(
                "DOGE",
                "Dogecoin",
                dec!(10),
                Price::new(dec!(0.062)),
                Thresholds::default(),
            )],
        );
        let mut status = strategy.status("DOGE");
        status.last_price = Some(Price::new(dec!(0.07)));
        status.take_profit_hit = true;
        strategy.set_status("DOGE", status);

        let view = StrategyView::from(strategy);
        assert_eq!(view.assets.len(), 1);
        assert!(view.assets[0].status.take_profit_hit);
        assert_eq!(view.assets[0].status.last_price, Some(dec!(0.07)));
    }
}
