//! Watched-table configuration.
//!
//! A watched table is a source table under change surveillance. Each one
//! is tracked either by its auto-increment id (new rows) or by a single
//! numeric metric column (value changes), selected in the
//! `WATCHED_TABLES` environment variable.

use super::ident::{ColumnName, TableName};
use crate::error::GatewayError;

/// How changes are detected for one watched table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionMode {
    /// New rows are detected by `id > watermark`.
    ById,
    /// Value changes in one numeric column are detected by diffing a
    /// full projection against an in-memory snapshot. Only suitable for
    /// small tables; the full scan runs every cycle.
    ByMetric {
        /// The tracked numeric column.
        column: ColumnName,
    },
}

/// One source table under change surveillance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedTable {
    /// Validated source table name.
    pub name: TableName,
    /// Detection mode for this table.
    pub mode: DetectionMode,
}

impl WatchedTable {
    /// Parses a single `WATCHED_TABLES` entry.
    ///
    /// Accepted forms: `orders` (id-tracked) and
    /// `videos:metric=view_count` (metric-tracked).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] or
    /// [`GatewayError::InvalidTableName`] on malformed entries.
    pub fn parse_entry(entry: &str) -> Result<Self, GatewayError> {
        let entry = entry.trim();
        match entry.split_once(':') {
            None => Ok(Self {
                name: TableName::parse(entry)?,
                mode: DetectionMode::ById,
            }),
            Some((name, mode)) => {
                let name = TableName::parse(name)?;
                let Some(column) = mode.strip_prefix("metric=") else {
                    return Err(GatewayError::InvalidRequest(format!(
                        "unknown detection mode '{mode}' for table '{name}'"
                    )));
                };
                Ok(Self {
                    name,
                    mode: DetectionMode::ByMetric {
                        column: ColumnName::parse(column)?,
                    },
                })
            }
        }
    }

    /// Parses the full comma-separated `WATCHED_TABLES` value.
    ///
    /// # Errors
    ///
    /// Returns the first entry parse error, or
    /// [`GatewayError::InvalidRequest`] on duplicate table names.
    pub fn parse_list(raw: &str) -> Result<Vec<Self>, GatewayError> {
        let mut tables: Vec<Self> = Vec::new();
        for entry in raw.split(',').filter(|e| !e.trim().is_empty()) {
            let table = Self::parse_entry(entry)?;
            if tables.iter().any(|t| t.name == table.name) {
                return Err(GatewayError::InvalidRequest(format!(
                    "table '{}' is watched twice",
                    table.name
                )));
            }
            tables.push(table);
        }
        Ok(tables)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn plain_entry_is_id_tracked() {
        let Ok(table) = WatchedTable::parse_entry("orders") else {
            panic!("valid entry");
        };
        assert_eq!(table.name.as_str(), "orders");
        assert_eq!(table.mode, DetectionMode::ById);
    }

    #[test]
    fn metric_entry_carries_column() {
        let Ok(table) = WatchedTable::parse_entry("videos:metric=view_count") else {
            panic!("valid entry");
        };
        assert_eq!(table.name.as_str(), "videos");
        match table.mode {
            DetectionMode::ByMetric { column } => assert_eq!(column.as_str(), "view_count"),
            DetectionMode::ById => panic!("expected metric mode"),
        }
    }

    #[test]
    fn unknown_mode_rejected() {
        assert!(WatchedTable::parse_entry("videos:push=true").is_err());
    }

    #[test]
    fn list_parses_mixed_entries() {
        let Ok(tables) = WatchedTable::parse_list("orders, videos:metric=view_count") else {
            panic!("valid list");
        };
        assert_eq!(tables.len(), 2);
    }

    #[test]
    fn duplicate_table_rejected() {
        assert!(WatchedTable::parse_list("orders,orders").is_err());
    }

    #[test]
    fn empty_list_is_empty() {
        let Ok(tables) = WatchedTable::parse_list("") else {
            panic!("valid list");
        };
        assert!(tables.is_empty());
    }
}
