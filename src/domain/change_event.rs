//! Ephemeral change events handed from the detector to the dispatcher.
//!
//! A [`ChangeEvent`] represents one detected insert or tracked-column
//! mutation. It is constructed per qualifying row, consumed once by the
//! dispatcher, and never persisted; the durable state is the watermark,
//! not the event.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ident::TableName;

/// Previous/current pair for a metric-tracked column change.
///
/// `difference` is signed (`current - previous`); a row never seen
/// before reports a zero baseline, so `difference == current`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricDelta {
    /// Value observed on the previous cycle (0 for first observation).
    pub previous: i64,
    /// Value observed this cycle.
    pub current: i64,
    /// Signed change, `current - previous`.
    pub difference: i64,
}

impl MetricDelta {
    /// Builds a delta from a previous observation (or the zero baseline)
    /// and the current value.
    #[must_use]
    pub fn new(previous: Option<i64>, current: i64) -> Self {
        let previous = previous.unwrap_or(0);
        Self {
            previous,
            current,
            difference: current.saturating_sub(previous),
        }
    }
}

/// One detected change, the unit of work for the dispatcher.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeEvent {
    /// Source table the change was detected in.
    pub table: TableName,
    /// Identifier of the changed row.
    pub row_id: i64,
    /// Full row payload as a JSON object.
    pub record: serde_json::Value,
    /// Present for metric-tracked tables: what moved and by how much.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<MetricDelta>,
    /// When the detector constructed this event.
    pub detected_at: DateTime<Utc>,
}

impl ChangeEvent {
    /// Event for a newly inserted row on an id-tracked table.
    #[must_use]
    pub fn inserted(table: TableName, row_id: i64, record: serde_json::Value) -> Self {
        Self {
            table,
            row_id,
            record,
            metric: None,
            detected_at: Utc::now(),
        }
    }

    /// Event for a tracked-column change on a metric-tracked table.
    #[must_use]
    pub fn metric_changed(
        table: TableName,
        row_id: i64,
        record: serde_json::Value,
        delta: MetricDelta,
    ) -> Self {
        Self {
            table,
            row_id,
            record,
            metric: Some(delta),
            detected_at: Utc::now(),
        }
    }

    /// Short human-readable description used in log lines.
    #[must_use]
    pub fn describe(&self) -> String {
        match self.metric {
            Some(delta) => format!(
                "{} row {} metric {} -> {}",
                self.table, self.row_id, delta.previous, delta.current
            ),
            None => format!("{} row {} inserted", self.table, self.row_id),
        }
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
    fn delta_with_baseline_zero() {
        let delta = MetricDelta::new(None, 7);
        assert_eq!(delta.previous, 0);
        assert_eq!(delta.current, 7);
        assert_eq!(delta.difference, 7);
    }

    #[test]
    fn delta_with_previous_value() {
        let delta = MetricDelta::new(Some(7), 10);
        assert_eq!(delta.difference, 3);
    }

    #[test]
    fn delta_can_be_negative() {
        let delta = MetricDelta::new(Some(10), 4);
        assert_eq!(delta.difference, -6);
    }

    #[test]
    fn inserted_event_has_no_metric() {
        let ev = ChangeEvent::inserted(table("orders"), 5, serde_json::json!({"id": 5}));
        assert!(ev.metric.is_none());
        assert!(ev.describe().contains("inserted"));
    }

    #[test]
    fn metric_event_serializes_delta() {
        let ev = ChangeEvent::metric_changed(
            table("videos"),
            3,
            serde_json::json!({"id": 3}),
            MetricDelta::new(Some(7), 10),
        );
        let json = serde_json::to_string(&ev).unwrap_or_default();
        assert!(json.contains("\"previous\":7"));
        assert!(json.contains("\"difference\":3"));
    }
}
