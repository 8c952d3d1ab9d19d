use crate::entities::StrategyId;
use thiserror::Error;

/// Error taxonomy shared across the engine.
///
/// Evaluation-layer errors never corrupt stored state; only confirmed
/// settlement outcomes move `ExecutionState` to a terminal value.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The price feed could not be reached or returned garbage. Recoverable:
    /// the current cycle is skipped and the last known status retained.
    #[error("price feed unavailable: {0}")]
    FeedUnavailable(String),

    /// The request itself is malformed (non-positive quantity, duplicate
    /// symbols, a trade outside the settleable range). Rejected before any
    /// state is touched.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The advisory client returned a malformed or out-of-range response.
    /// Recovered locally by falling back to the static multiplier table.
    #[error("invalid advisory response: {0}")]
    InvalidAdvisoryResponse(String),

    /// An execution for this symbol is already in flight. A rejected
    /// request, not an error state for the asset.
    #[error("execution already in flight for {symbol}")]
    AlreadyExecuting { symbol: String },

    /// The asset was already sold; duplicate submissions are rejected.
    #[error("asset {symbol} already settled")]
    AlreadySettled { symbol: String },

    /// A two-party vend was submitted without both required signatures.
    #[error("missing co-signer for vend: {0}")]
    MissingCosigner(String),

    /// The ledger did not confirm the settlement within the bounded wait.
    /// The asset returns to `Failed`; the submission itself is never
    /// resent, a later evaluation cycle starts a fresh execution instead.
    #[error("settlement confirmation timed out (tx {tx_id})")]
    SettlementTimeout { tx_id: String },

    /// The ledger rejected or failed the settlement.
    #[error("settlement failed: {0}")]
    SettlementFailed(String),

    /// A required piece of configuration is absent. Fatal for the
    /// operation; surfaced immediately, no retry.
    #[error("configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("strategy {0} not found")]
    StrategyNotFound(StrategyId),

    #[error("asset {0} not found in strategy")]
    AssetNotFound(String),

    #[error("store error: {0}")]
    Store(String),
}

impl EngineError {
    /// Whether the request was rejected by a guard rather than failing the
    /// asset (no state transition happened).
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            EngineError::AlreadyExecuting { .. } | EngineError::AlreadySettled { .. }
        )
    }
}
