//! Route definitions and handlers.

use crate::error::ApiError;
use crate::models::{
    DeployStrategyRequest, EditStrategyRequest, ExecutionRecordView, QuoteView, SellResponse,
    StrategyView,
};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use hodl_domain::prelude::*;
use hodl_engine::service::{DeployRequest, NewAsset, StrategyPatch, ThresholdPatch};
use hodl_engine::explorer_url;
use serde::Deserialize;
use uuid::Uuid;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/strategies", post(deploy_strategy).get(list_strategies))
        .route(
            "/api/strategies/{id}",
            get(get_strategy).patch(edit_strategy).delete(delete_strategy),
        )
        .route("/api/strategies/{id}/assets/{symbol}/sell", post(sell_now))
        .route(
            "/api/strategies/{id}/assets/{symbol}/history",
            get(history),
        )
        .route("/api/quotes", get(quotes))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn deploy_strategy(
    State(state): State<AppState>,
    Json(request): Json<DeployStrategyRequest>,
) -> Result<(StatusCode, Json<StrategyView>), ApiError> {
    let deploy = DeployRequest {
        owner_address: request.owner_address,
        risk_profile: request.risk_profile,
        ai_take_profit: request.ai_take_profit,
        ai_stop_loss: request.ai_stop_loss,
        assets: request
            .assets
            .into_iter()
            .map(|a| NewAsset {
                symbol: a.symbol,
                quantity: a.quantity,
            })
            .collect(),
    };
    let strategy = state.service.deploy_strategy(deploy).await?;
    Ok((StatusCode::CREATED, Json(strategy.into())))
}

async fn list_strategies(
    State(state): State<AppState>,
) -> Result<Json<Vec<StrategyView>>, ApiError> {
    let strategies = state.service.strategies().await?;
    Ok(Json(strategies.into_iter().map(StrategyView::from).collect()))
}

async fn get_strategy(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StrategyView>, ApiError> {
    let strategy = state.service.strategy(StrategyId(id)).await?;
    Ok(Json(strategy.into()))
}

async fn edit_strategy(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<EditStrategyRequest>,
) -> Result<Json<StrategyView>, ApiError> {
    let patch = StrategyPatch {
        risk_profile: request.risk_profile,
        toggles: request.toggles,
        thresholds: request
            .thresholds
            .into_iter()
            .map(|t| ThresholdPatch {
                symbol: t.symbol,
                take_profit: t.take_profit.map(Price::new),
                stop_loss: t.stop_loss.map(Price::new),
            })
            .collect(),
        remove_assets: request.remove_assets,
    };
    let strategy = state.service.edit_strategy(StrategyId(id), patch).await?;
    Ok(Json(strategy.into()))
}

async fn delete_strategy(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.service.delete_strategy(StrategyId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn sell_now(
    State(state): State<AppState>,
    Path((id, symbol)): Path<(Uuid, String)>,
) -> Result<Json<SellResponse>, ApiError> {
    let record = state.service.sell_now(StrategyId(id), &symbol).await?;
    let explorer = record
        .tx_id
        .as_deref()
        .map(|tx| explorer_url(&state.network, tx));
    Ok(Json(SellResponse {
        record: record.into(),
        explorer_url: explorer,
    }))
}

async fn history(
    State(state): State<AppState>,
    Path((id, symbol)): Path<(Uuid, String)>,
) -> Result<Json<Vec<ExecutionRecordView>>, ApiError> {
    let records = state.service.history(StrategyId(id), &symbol).await?;
    Ok(Json(
        records.into_iter().map(ExecutionRecordView::from).collect(),
    ))
}

#[derive(Debug, Deserialize)]
struct QuotesQuery {
    /// Comma-separated symbol list.
    symbols: String,
}

async fn quotes(
    State(state): State<AppState>,
    Query(query): Query<QuotesQuery>,
) -> Result<Json<Vec<QuoteView>>, ApiError> {
    let symbols: Vec<String> = query
        .symbols
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect();
    let quotes = state.service.quotes(&symbols).await?;
    let mut views: Vec<QuoteView> = quotes.into_values().map(QuoteView::from).collect();
    views.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    Ok(Json(views))
}
