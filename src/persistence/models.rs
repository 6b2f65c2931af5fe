//! Database models for the tracking table and detector queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row from the `watched_tables` tracking table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingEntry {
    /// Watched source table name (unique key).
    pub table_name: String,
    /// Highest row id already fully processed for this table.
    pub last_processed_id: i64,
    /// Timestamp of the most recent poll attempt, updated even when
    /// zero rows were found.
    pub last_check_time: DateTime<Utc>,
}

/// One qualifying row returned by a detection query.
#[derive(Debug, Clone)]
pub struct DetectedRow {
    /// Row identifier.
    pub id: i64,
    /// Full row payload as a JSON object.
    pub record: serde_json::Value,
}
