//! Durable tracking store for per-table watermarks.
//!
//! The `watched_tables` table is the durability boundary for
//! at-least-once delivery: the watermark only moves past a row after its
//! notification attempt completed. The store enforces monotonicity; the
//! only way to move a watermark backward is the explicit administrative
//! [`TrackingStore::reset_watermark`].

use sqlx::PgPool;

use super::models::TrackingEntry;
use crate::domain::WatchedTable;
use crate::error::GatewayError;

/// DDL for the tracking table. Safe to run on every boot.
const TRACKING_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS watched_tables (\
     table_name TEXT PRIMARY KEY, \
     last_processed_id BIGINT NOT NULL DEFAULT 0, \
     last_check_time TIMESTAMPTZ NOT NULL DEFAULT now())";

/// PostgreSQL-backed watermark store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct TrackingStore {
    pool: PgPool,
}

impl TrackingStore {
    /// Creates a new tracking store with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Idempotently creates the tracking table and registers every
    /// configured watched table with a zero watermark, never overwriting
    /// an existing row.
    ///
    /// Returns the names that were newly registered; the caller seeds
    /// those from the source table's current maximum id so pre-existing
    /// rows are not treated as new.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on schema or insert failure.
    pub async fn ensure_schema(
        &self,
        tables: &[WatchedTable],
    ) -> Result<Vec<String>, GatewayError> {
        sqlx::query(TRACKING_SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(GatewayError::db)?;

        let mut fresh = Vec::new();
        for table in tables {
            let result = sqlx::query(
                "INSERT INTO watched_tables (table_name) VALUES ($1) \
                 ON CONFLICT (table_name) DO NOTHING",
            )
            .bind(table.name.as_str())
            .execute(&self.pool)
            .await
            .map_err(GatewayError::db)?;

            if result.rows_affected() == 1 {
                tracing::info!(table = %table.name, "registered table for tracking");
                fresh.push(table.name.as_str().to_string());
            }
        }
        Ok(fresh)
    }

    /// Returns the stored watermark for one table.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::TrackingNotFound`] when the table was
    /// never registered, [`GatewayError::Database`] on query failure.
    pub async fn watermark(&self, table: &str) -> Result<i64, GatewayError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT last_processed_id FROM watched_tables WHERE table_name = $1",
        )
        .bind(table)
        .fetch_optional(&self.pool)
        .await
        .map_err(GatewayError::db)?
        .ok_or_else(|| GatewayError::TrackingNotFound(table.to_string()))
    }

    /// Moves the watermark forward to `new_id` and stamps the check time.
    ///
    /// The update is guarded: a candidate below the stored value is
    /// logged as a warning and ignored, so a racing or replayed cycle
    /// can never regress the watermark.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::TrackingNotFound`] for unregistered
    /// tables, [`GatewayError::Database`] on query failure.
    pub async fn advance_watermark(&self, table: &str, new_id: i64) -> Result<(), GatewayError> {
        let result = sqlx::query(
            "UPDATE watched_tables \
             SET last_processed_id = $2, last_check_time = now() \
             WHERE table_name = $1 AND last_processed_id <= $2",
        )
        .bind(table)
        .bind(new_id)
        .execute(&self.pool)
        .await
        .map_err(GatewayError::db)?;

        if result.rows_affected() == 0 {
            // Either unregistered or a regression attempt; the read
            // distinguishes the two.
            let current = self.watermark(table).await?;
            tracing::warn!(
                table,
                current,
                candidate = new_id,
                "watermark regression rejected"
            );
        }
        Ok(())
    }

    /// Administrative override: sets the watermark to an explicit value
    /// regardless of monotonicity, for replay or poison-row skipping.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::TrackingNotFound`] for unregistered
    /// tables, [`GatewayError::Database`] on query failure.
    pub async fn reset_watermark(&self, table: &str, id: i64) -> Result<(), GatewayError> {
        let result = sqlx::query(
            "UPDATE watched_tables \
             SET last_processed_id = $2, last_check_time = now() \
             WHERE table_name = $1",
        )
        .bind(table)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(GatewayError::db)?;

        if result.rows_affected() == 0 {
            return Err(GatewayError::TrackingNotFound(table.to_string()));
        }
        tracing::info!(table, watermark = id, "watermark reset");
        Ok(())
    }

    /// Stamps `last_check_time` without touching the watermark, so
    /// external health checks can observe liveness even on zero-row
    /// cycles.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on query failure.
    pub async fn touch_check_time(&self, table: &str) -> Result<(), GatewayError> {
        sqlx::query("UPDATE watched_tables SET last_check_time = now() WHERE table_name = $1")
            .bind(table)
            .execute(&self.pool)
            .await
            .map_err(GatewayError::db)?;
        Ok(())
    }

    /// Returns the full tracking state for the administrative surface.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on query failure.
    pub async fn load_all(&self) -> Result<Vec<TrackingEntry>, GatewayError> {
        let rows = sqlx::query_as::<_, (String, i64, chrono::DateTime<chrono::Utc>)>(
            "SELECT table_name, last_processed_id, last_check_time \
             FROM watched_tables ORDER BY table_name ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(GatewayError::db)?;

        Ok(rows
            .into_iter()
            .map(
                |(table_name, last_processed_id, last_check_time)| TrackingEntry {
                    table_name,
                    last_processed_id,
                    last_check_time,
                },
            )
            .collect())
    }
}
