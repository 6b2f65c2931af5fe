//! Dynamic row access for watched and passthrough tables.
//!
//! All SQL here interpolates table/column identifiers that have already
//! passed [`TableName`]/[`ColumnName`] validation; every value travels
//! as a bound parameter. Rows cross the boundary as `serde_json::Value`
//! objects via `to_jsonb` / `jsonb_populate_record`, so the gateway
//! needs no compile-time knowledge of the source schema.

use sqlx::PgPool;

use super::models::DetectedRow;
use crate::domain::{ColumnName, RecordKey, TableName};
use crate::error::GatewayError;

/// PostgreSQL row store shared by the CRUD passthrough and the detector.
#[derive(Debug, Clone)]
pub struct RecordStore {
    pool: PgPool,
}

/// Validates a JSON insert/update payload and extracts its column list.
///
/// The client-supplied primary key is always stripped: the database
/// assigns ids.
fn payload_columns(payload: &serde_json::Value) -> Result<Vec<ColumnName>, GatewayError> {
    let Some(object) = payload.as_object() else {
        return Err(GatewayError::InvalidRequest(
            "payload must be a JSON object".to_string(),
        ));
    };
    let mut columns = Vec::with_capacity(object.len());
    for key in object.keys() {
        if key == "id" {
            continue;
        }
        columns.push(ColumnName::parse(key)?);
    }
    if columns.is_empty() {
        return Err(GatewayError::InvalidRequest(
            "payload has no insertable columns".to_string(),
        ));
    }
    Ok(columns)
}

/// Builds the insert statement for a validated column list.
fn insert_sql(table: &TableName, columns: &[ColumnName]) -> String {
    let names: Vec<&str> = columns.iter().map(ColumnName::as_str).collect();
    let sources: Vec<String> = names.iter().map(|c| format!("p.{c}")).collect();
    format!(
        "INSERT INTO {table} ({}) SELECT {} \
         FROM jsonb_populate_record(NULL::{table}, $1) AS p \
         RETURNING to_jsonb({table})",
        names.join(", "),
        sources.join(", "),
    )
}

/// Builds the update statement for a validated column list.
fn update_sql(table: &TableName, columns: &[ColumnName]) -> String {
    let assignments: Vec<String> = columns
        .iter()
        .map(|c| format!("{c} = p.{c}"))
        .collect();
    format!(
        "UPDATE {table} SET {} \
         FROM jsonb_populate_record(NULL::{table}, $2) AS p \
         WHERE {table}.id = $1 \
         RETURNING to_jsonb({table})",
        assignments.join(", "),
    )
}

impl RecordStore {
    /// Creates a new record store with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Bounded range query behind id-tracked detection: rows with
    /// `id > watermark`, ascending, capped at `limit`.
    ///
    /// Ascending order is what lets the watermark advance over the
    /// contiguous delivered prefix; the cap bounds per-cycle memory and
    /// latency, draining a backlog over multiple cycles.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on query failure.
    pub async fn rows_after(
        &self,
        table: &TableName,
        watermark: i64,
        limit: i64,
    ) -> Result<Vec<DetectedRow>, GatewayError> {
        let sql = format!(
            "SELECT r.id::bigint, to_jsonb(r) FROM \
             (SELECT * FROM {table} WHERE id > $1 ORDER BY id ASC LIMIT $2) AS r \
             ORDER BY r.id ASC"
        );
        let rows = sqlx::query_as::<_, (i64, serde_json::Value)>(&sql)
            .bind(watermark)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(GatewayError::db)?;

        Ok(rows
            .into_iter()
            .map(|(id, record)| DetectedRow { id, record })
            .collect())
    }

    /// Full `(id, metric)` projection of a metric-tracked table.
    ///
    /// This is a full-table scan every cycle, acceptable only because
    /// metric-tracked tables are expected to stay small. Larger tables
    /// need an `updated_at` column or a change-log table instead.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on query failure.
    pub async fn metric_projection(
        &self,
        table: &TableName,
        column: &ColumnName,
    ) -> Result<Vec<(i64, i64)>, GatewayError> {
        let sql = format!(
            "SELECT id::bigint, COALESCE({column}, 0)::bigint FROM {table} ORDER BY id ASC"
        );
        sqlx::query_as::<_, (i64, i64)>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(GatewayError::db)
    }

    /// Current maximum id of a source table (0 when empty), used to seed
    /// freshly registered watermarks.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on query failure.
    pub async fn max_id(&self, table: &TableName) -> Result<i64, GatewayError> {
        let sql = format!("SELECT COALESCE(MAX(id), 0)::bigint FROM {table}");
        sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(GatewayError::db)
    }

    /// Fetches one row by its numeric id.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on query failure.
    pub async fn fetch_by_id(
        &self,
        table: &TableName,
        id: i64,
    ) -> Result<Option<serde_json::Value>, GatewayError> {
        let sql = format!("SELECT to_jsonb(r) FROM {table} AS r WHERE r.id = $1");
        sqlx::query_scalar::<_, serde_json::Value>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(GatewayError::db)
    }

    /// Fetches one row by id or secondary token.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on query failure.
    pub async fn fetch(
        &self,
        table: &TableName,
        key: &RecordKey,
        token_column: &ColumnName,
    ) -> Result<Option<serde_json::Value>, GatewayError> {
        match key {
            RecordKey::ById(id) => self.fetch_by_id(table, *id).await,
            RecordKey::ByToken(token) => {
                let sql =
                    format!("SELECT to_jsonb(r) FROM {table} AS r WHERE r.{token_column} = $1");
                sqlx::query_scalar::<_, serde_json::Value>(&sql)
                    .bind(token)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(GatewayError::db)
            }
        }
    }

    /// Lists rows in id order with limit/offset paging.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on query failure.
    pub async fn list(
        &self,
        table: &TableName,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<serde_json::Value>, GatewayError> {
        let sql = format!("SELECT to_jsonb(r) FROM {table} AS r ORDER BY r.id ASC LIMIT $1 OFFSET $2");
        sqlx::query_scalar::<_, serde_json::Value>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(GatewayError::db)
    }

    /// Inserts a row from a JSON payload, returning the stored row.
    ///
    /// Any client-supplied `id` is stripped before the insert; columns
    /// absent from the payload keep their database defaults.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for non-object or empty
    /// payloads and invalid column names, [`GatewayError::Database`] on
    /// query failure.
    pub async fn insert(
        &self,
        table: &TableName,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value, GatewayError> {
        let columns = payload_columns(payload)?;
        let sql = insert_sql(table, &columns);
        sqlx::query_scalar::<_, serde_json::Value>(&sql)
            .bind(payload)
            .fetch_one(&self.pool)
            .await
            .map_err(GatewayError::db)
    }

    /// Updates the payload's columns on the row with the given id,
    /// returning the updated row, or `None` when the id does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for malformed payloads,
    /// [`GatewayError::Database`] on query failure.
    pub async fn update(
        &self,
        table: &TableName,
        id: i64,
        payload: &serde_json::Value,
    ) -> Result<Option<serde_json::Value>, GatewayError> {
        let columns = payload_columns(payload)?;
        let sql = update_sql(table, &columns);
        sqlx::query_scalar::<_, serde_json::Value>(&sql)
            .bind(id)
            .bind(payload)
            .fetch_optional(&self.pool)
            .await
            .map_err(GatewayError::db)
    }

    /// Deletes the row with the given id. Returns `true` when a row was
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Database`] on query failure.
    pub async fn delete(&self, table: &TableName, id: i64) -> Result<bool, GatewayError> {
        let sql = format!("DELETE FROM {table} WHERE id = $1");
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(GatewayError::db)?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn table(name: &str) -> TableName {
        let Ok(t) = TableName::parse(name) else {
            panic!("valid table name");
        };
        t
    }

    #[test]
    fn payload_columns_strips_id() {
        let payload = serde_json::json!({"id": 9, "title": "a", "views": 3});
        let Ok(columns) = payload_columns(&payload) else {
            panic!("valid payload");
        };
        let names: Vec<&str> = columns.iter().map(ColumnName::as_str).collect();
        assert!(!names.contains(&"id"));
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn payload_must_be_object() {
        assert!(payload_columns(&serde_json::json!([1, 2])).is_err());
        assert!(payload_columns(&serde_json::json!("x")).is_err());
    }

    #[test]
    fn payload_with_only_id_is_rejected() {
        assert!(payload_columns(&serde_json::json!({"id": 1})).is_err());
    }

    #[test]
    fn payload_with_bad_column_is_rejected() {
        let payload = serde_json::json!({"ti tle; drop": "x"});
        assert!(payload_columns(&payload).is_err());
    }

    #[test]
    fn insert_sql_shape() {
        let Ok(cols) = payload_columns(&serde_json::json!({"title": "a", "views": 1})) else {
            panic!("valid payload");
        };
        let sql = insert_sql(&table("videos"), &cols);
        assert!(sql.starts_with("INSERT INTO videos ("));
        assert!(sql.contains("jsonb_populate_record(NULL::videos, $1)"));
        assert!(sql.ends_with("RETURNING to_jsonb(videos)"));
    }

    #[test]
    fn update_sql_shape() {
        let Ok(cols) = payload_columns(&serde_json::json!({"title": "a"})) else {
            panic!("valid payload");
        };
        let sql = update_sql(&table("videos"), &cols);
        assert!(sql.contains("SET title = p.title"));
        assert!(sql.contains("WHERE videos.id = $1"));
    }
}
