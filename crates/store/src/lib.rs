//! Durable strategy storage.
//!
//! The store holds the strategy aggregate (thresholds, per-asset status)
//! and the append-only execution history. Aggregate writes are whole-record
//! replace; the execution guard is the one conditional update, so multiple
//! engine instances sharing a store cannot both claim the same asset.

/// In-memory store for tests and single-process runs.
pub mod memory;
/// Postgres-backed store.
pub mod postgres;

use async_trait::async_trait;
use hodl_domain::prelude::*;
use thiserror::Error;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Store-level failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("strategy {0} not found")]
    NotFound(StrategyId),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => EngineError::StrategyNotFound(id),
            other => EngineError::Store(other.to_string()),
        }
    }
}

/// Result of attempting to claim the execution guard for a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionClaim {
    /// The guard was taken; the caller owns the execution.
    Claimed,
    /// Another execution is already in flight.
    InFlight,
    /// The asset was already settled; nothing to execute.
    Settled,
    /// The strategy or asset no longer exists.
    NotFound,
}

/// Terminal outcome reported back to the store after an execution attempt.
#[derive(Debug, Clone)]
pub enum ExecutionOutcome {
    /// Settlement confirmed; the asset leaves the monitored set.
    Settled {
        tx_id: String,
        amount: SettlementAmount,
    },
    /// Settlement failed; the asset stays monitored for retry.
    Failed { reason: String },
}

/// Persistence contract for strategy aggregates and execution history.
#[async_trait]
pub trait StrategyStore: Send + Sync {
    /// Saves (inserts or replaces) a whole aggregate.
    async fn save(&self, strategy: &Strategy) -> Result<(), StoreError>;

    /// Loads an aggregate.
    async fn load(&self, id: StrategyId) -> Result<Option<Strategy>, StoreError>;

    /// Lists all stored aggregates.
    async fn list(&self) -> Result<Vec<Strategy>, StoreError>;

    /// Deletes an aggregate. Returns whether it existed.
    async fn delete(&self, id: StrategyId) -> Result<bool, StoreError>;

    /// Merges a fresh observation (price, timestamp, hit flags) into the
    /// stored status for one symbol. Execution fields are never written
    /// through this path; they belong to the guard and outcome calls, so
    /// an observation racing an in-flight execution cannot release the
    /// guard. A no-op if the strategy or asset is gone.
    async fn update_status(
        &self,
        id: StrategyId,
        symbol: &str,
        status: &AssetStatus,
    ) -> Result<(), StoreError>;

    /// Conditionally moves a symbol's execution state to `Executing`.
    ///
    /// Succeeds only from `Idle` or `Failed`. This is the engine's
    /// at-most-one-in-flight guarantee and must stay conditional even with
    /// concurrent engine instances.
    async fn try_begin_execution(
        &self,
        id: StrategyId,
        symbol: &str,
    ) -> Result<ExecutionClaim, StoreError>;

    /// Records the outcome of a claimed execution.
    ///
    /// On `Settled` the asset is retired from the monitored set; its status
    /// stays behind as `Executed`. If the strategy vanished while the
    /// settlement was in flight the outcome is discarded and `NotFound`
    /// is returned so the caller can drop the result.
    async fn finish_execution(
        &self,
        id: StrategyId,
        symbol: &str,
        outcome: ExecutionOutcome,
    ) -> Result<(), StoreError>;

    /// Appends an immutable execution record.
    async fn append_record(&self, record: &ExecutionRecord) -> Result<(), StoreError>;

    /// Execution history for one symbol, oldest first.
    async fn history(
        &self,
        id: StrategyId,
        symbol: &str,
    ) -> Result<Vec<ExecutionRecord>, StoreError>;
}
