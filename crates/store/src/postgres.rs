//! Postgres-backed strategy store.
//!
//! Aggregates are stored as one JSONB document per strategy (whole-record
//! replace on write). Execution history lives in its own append-only table.
//! The execution guard runs inside a transaction with a row lock, so
//! concurrent engine instances sharing the database cannot both observe an
//! idle asset and double-execute.

use crate::{ExecutionClaim, ExecutionOutcome, StoreError, StrategyStore};
use async_trait::async_trait;
use hodl_domain::prelude::*;
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Strategy store backed by Postgres.
#[derive(Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Creates the schema if it does not exist.
    ///
    /// # Errors
    /// Returns an error if a DDL statement fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS strategies (
                id UUID PRIMARY KEY,
                doc JSONB NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS execution_history (
                id UUID PRIMARY KEY,
                strategy_id UUID NOT NULL,
                symbol TEXT NOT NULL,
                reason TEXT NOT NULL,
                quantity NUMERIC NOT NULL,
                execution_price NUMERIC NOT NULL,
                settlement_minor_units BIGINT NOT NULL,
                tx_id TEXT,
                success BOOLEAN NOT NULL,
                error TEXT,
                executed_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS execution_history_asset_idx
                ON execution_history (strategy_id, symbol, executed_at)
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    fn record_from_row(row: &PgRow) -> Result<ExecutionRecord, StoreError> {
        let reason: String = row.try_get("reason")?;
        let reason = TriggerReason::from_str(&reason)
            .map_err(|e| StoreError::Serialization(serde::de::Error::custom(e)))?;
        let price: Decimal = row.try_get("execution_price")?;
        let minor_units: i64 = row.try_get("settlement_minor_units")?;

        Ok(ExecutionRecord {
            id: row.try_get("id")?,
            strategy_id: StrategyId(row.try_get::<Uuid, _>("strategy_id")?),
            symbol: row.try_get("symbol")?,
            reason,
            quantity: row.try_get("quantity")?,
            execution_price: Price::new(price),
            settlement_amount: SettlementAmount::from_minor_units(minor_units as u64),
            tx_id: row.try_get("tx_id")?,
            success: row.try_get("success")?,
            error: row.try_get("error")?,
            executed_at: row.try_get("executed_at")?,
        })
    }
}

#[async_trait]
impl StrategyStore for PostgresStore {
    async fn save(&self, strategy: &Strategy) -> Result<(), StoreError> {
        let doc = serde_json::to_value(strategy)?;
        sqlx::query(
            r#"
            INSERT INTO strategies (id, doc, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (id) DO UPDATE SET doc = EXCLUDED.doc, updated_at = now()
            "#,
        )
        .bind(strategy.id.0)
        .bind(doc)
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    async fn load(&self, id: StrategyId) -> Result<Option<Strategy>, StoreError> {
        let row = sqlx::query("SELECT doc FROM strategies WHERE id = $1")
            .bind(id.0)
            .fetch_optional(self.pool.as_ref())
            .await?;

        match row {
            Some(row) => {
                let doc: serde_json::Value = row.try_get("doc")?;
                Ok(Some(serde_json::from_value(doc)?))
            }
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<Strategy>, StoreError> {
        let rows = sqlx::query("SELECT doc FROM strategies ORDER BY updated_at")
            .fetch_all(self.pool.as_ref())
            .await?;

        let mut strategies = Vec::with_capacity(rows.len());
        for row in &rows {
            let doc: serde_json::Value = row.try_get("doc")?;
            strategies.push(serde_json::from_value(doc)?);
        }
        Ok(strategies)
    }

    async fn delete(&self, id: StrategyId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM strategies WHERE id = $1")
            .bind(id.0)
            .execute(self.pool.as_ref())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_status(
        &self,
        id: StrategyId,
        symbol: &str,
        status: &AssetStatus,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT doc FROM strategies WHERE id = $1 FOR UPDATE")
            .bind(id.0)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(());
        };

        let doc: serde_json::Value = row.try_get("doc")?;
        let mut strategy: Strategy = serde_json::from_value(doc)?;
        if strategy.asset(symbol).is_none() {
            debug!(symbol = %symbol, "discarding status for absent asset");
            tx.rollback().await?;
            return Ok(());
        }
        let mut current = strategy.status(symbol);
        current.merge_observation(status);
        strategy.set_status(symbol, current);

        sqlx::query("UPDATE strategies SET doc = $2, updated_at = now() WHERE id = $1")
            .bind(id.0)
            .bind(serde_json::to_value(&strategy)?)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn try_begin_execution(
        &self,
        id: StrategyId,
        symbol: &str,
    ) -> Result<ExecutionClaim, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT doc FROM strategies WHERE id = $1 FOR UPDATE")
            .bind(id.0)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(ExecutionClaim::NotFound);
        };

        let doc: serde_json::Value = row.try_get("doc")?;
        let mut strategy: Strategy = serde_json::from_value(doc)?;

        let mut status = strategy.status(symbol);
        let claim = match status.execution {
            ExecutionState::Executing => ExecutionClaim::InFlight,
            ExecutionState::Executed => ExecutionClaim::Settled,
            _ if strategy.asset(symbol).is_none() => ExecutionClaim::NotFound,
            _ => {
                status.execution = ExecutionState::Executing;
                strategy.set_status(symbol, status);
                sqlx::query("UPDATE strategies SET doc = $2, updated_at = now() WHERE id = $1")
                    .bind(id.0)
                    .bind(serde_json::to_value(&strategy)?)
                    .execute(&mut *tx)
                    .await?;
                ExecutionClaim::Claimed
            }
        };

        tx.commit().await?;
        Ok(claim)
    }

    async fn finish_execution(
        &self,
        id: StrategyId,
        symbol: &str,
        outcome: ExecutionOutcome,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT doc FROM strategies WHERE id = $1 FOR UPDATE")
            .bind(id.0)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            tx.rollback().await?;
            return Err(StoreError::NotFound(id));
        };

        let doc: serde_json::Value = row.try_get("doc")?;
        let mut strategy: Strategy = serde_json::from_value(doc)?;

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

        sqlx::query("UPDATE strategies SET doc = $2, updated_at = now() WHERE id = $1")
            .bind(id.0)
            .bind(serde_json::to_value(&strategy)?)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn append_record(&self, record: &ExecutionRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO execution_history
                (id, strategy_id, symbol, reason, quantity, execution_price,
                 settlement_minor_units, tx_id, success, error, executed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(record.id)
        .bind(record.strategy_id.0)
        .bind(&record.symbol)
        .bind(record.reason.as_str())
        .bind(record.quantity)
        .bind(record.execution_price.value)
        .bind(record.settlement_amount.minor_units as i64)
        .bind(&record.tx_id)
        .bind(record.success)
        .bind(&record.error)
        .bind(record.executed_at)
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    async fn history(
        &self,
        id: StrategyId,
        symbol: &str,
    ) -> Result<Vec<ExecutionRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM execution_history
            WHERE strategy_id = $1 AND symbol = $2
            ORDER BY executed_at ASC
            "#,
        )
        .bind(id.0)
        .bind(symbol)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.iter().map(Self::record_from_row).collect()
    }
}
