//! Error responses.
//!
//! Maps [`EngineError`] onto HTTP statuses. Guard rejections are conflicts,
//! not failures: a 409 means the request was valid but lost to another
//! execution or arrived after settlement.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hodl_domain::prelude::*;
use serde_json::json;
use tracing::warn;

/// API-level error wrapper.
#[derive(Debug)]
pub struct ApiError(pub EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            EngineError::AlreadyExecuting { .. } | EngineError::AlreadySettled { .. } => {
                StatusCode::CONFLICT
            }
            EngineError::StrategyNotFound(_) | EngineError::AssetNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            EngineError::FeedUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            EngineError::MissingCosigner(_) | EngineError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            EngineError::InvalidAdvisoryResponse(_)
            | EngineError::SettlementFailed(_)
            | EngineError::SettlementTimeout { .. } => StatusCode::BAD_GATEWAY,
            EngineError::ConfigurationMissing(_) | EngineError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = %self.0, "request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
