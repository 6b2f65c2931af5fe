//! Process-local mirror of durable tracking state.
//!
//! [`WatermarkCache`] is the fast-path copy of the per-table watermarks
//! stored in the tracking table. It is hydrated once at boot and is
//! allowed to diverge from the store only for the lifetime of one poll
//! cycle before being flushed back. It is never the durability boundary:
//! a restart reloads from the tracking store, not from here.
//!
//! [`MetricSnapshot`] holds the last-observed metric value per row for a
//! metric-tracked table. It is rebuilt empty at boot, so a restart emits
//! one synthetic "from 0" event per existing row with a nonzero metric
//! on the next cycle. That re-notification is accepted; the webhook
//! payload carries enough context for downstream deduplication.

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::change_event::MetricDelta;

/// In-memory watermark mirror, keyed by table name.
#[derive(Debug, Default)]
pub struct WatermarkCache {
    inner: RwLock<HashMap<String, i64>>,
}

impl WatermarkCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the cached watermark for one table, used during boot
    /// hydration and after administrative resets.
    pub async fn set(&self, table: &str, watermark: i64) {
        self.inner.write().await.insert(table.to_string(), watermark);
    }

    /// Returns the cached watermark for a table, if hydrated.
    pub async fn get(&self, table: &str) -> Option<i64> {
        self.inner.read().await.get(table).copied()
    }

    /// Moves the watermark forward, never backward.
    ///
    /// Returns `true` when the cached value moved. A candidate at or
    /// below the current value is a no-op, mirroring the guarded update
    /// in the tracking store.
    pub async fn advance(&self, table: &str, candidate: i64) -> bool {
        let mut map = self.inner.write().await;
        let entry = map.entry(table.to_string()).or_insert(0);
        if candidate > *entry {
            *entry = candidate;
            true
        } else {
            false
        }
    }

    /// Returns a point-in-time copy of all cached watermarks.
    pub async fn snapshot(&self) -> HashMap<String, i64> {
        self.inner.read().await.clone()
    }
}

/// Last-observed metric value per row id for one metric-tracked table.
///
/// The `diff`/`commit` split lets the detector withhold the snapshot
/// update for a changed row whose notification failed, so the change is
/// re-detected on the next cycle.
#[derive(Debug, Default)]
pub struct MetricSnapshot {
    values: HashMap<i64, i64>,
}

impl MetricSnapshot {
    /// Creates an empty snapshot (every row reads as "never seen").
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compares an observed value against the snapshot.
    ///
    /// Returns `Some(delta)` when the observed value differs from the
    /// stored baseline, with a never-seen row reading as zero; `None`
    /// when unchanged. The zero baseline means a first observation of
    /// zero is not a change, so rows with a zero (or NULL-coalesced)
    /// metric stay silent across restarts. Does not modify the snapshot.
    #[must_use]
    pub fn diff(&self, row_id: i64, current: i64) -> Option<MetricDelta> {
        let previous = self.values.get(&row_id).copied();
        if previous.unwrap_or(0) == current {
            return None;
        }
        Some(MetricDelta::new(previous, current))
    }

    /// Records an observed value as the baseline for the next cycle.
    pub fn commit(&mut self, row_id: i64, current: i64) {
        self.values.insert(row_id, current);
    }

    /// Number of rows with a recorded baseline.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when no baseline has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_before_hydration_is_none() {
        let cache = WatermarkCache::new();
        assert_eq!(cache.get("orders").await, None);
    }

    #[tokio::test]
    async fn advance_moves_forward_only() {
        let cache = WatermarkCache::new();
        cache.set("orders", 10).await;

        assert!(cache.advance("orders", 15).await);
        assert_eq!(cache.get("orders").await, Some(15));

        // Regression and equal candidates are no-ops.
        assert!(!cache.advance("orders", 12).await);
        assert!(!cache.advance("orders", 15).await);
        assert_eq!(cache.get("orders").await, Some(15));
    }

    #[tokio::test]
    async fn set_allows_explicit_regression() {
        let cache = WatermarkCache::new();
        cache.set("orders", 100).await;
        cache.set("orders", 5).await;
        assert_eq!(cache.get("orders").await, Some(5));
    }

    // Feed a deterministic pseudo-random candidate sequence and assert
    // the stored value never decreases.
    #[tokio::test]
    async fn advance_is_monotonic_under_random_candidates() {
        let cache = WatermarkCache::new();
        cache.set("t", 0).await;

        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        let mut last = 0i64;
        for _ in 0..500 {
            state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            let candidate = (state >> 40) as i64;
            cache.advance("t", candidate).await;
            let Some(current) = cache.get("t").await else {
                panic!("watermark vanished");
            };
            assert!(current >= last, "watermark regressed: {last} -> {current}");
            last = current;
        }
    }

    #[test]
    fn snapshot_first_observation_uses_zero_baseline() {
        let snap = MetricSnapshot::new();
        let Some(delta) = snap.diff(1, 7) else {
            panic!("first observation must be a change");
        };
        assert_eq!(delta.previous, 0);
        assert_eq!(delta.current, 7);
        assert_eq!(delta.difference, 7);
    }

    #[test]
    fn snapshot_zero_first_observation_is_silent() {
        let mut snap = MetricSnapshot::new();

        // A fresh (or rebuilt-at-boot) snapshot must not report rows
        // whose metric is still zero.
        assert!(snap.diff(1, 0).is_none());
        snap.commit(1, 0);

        // The first real movement is reported from the zero baseline.
        let Some(delta) = snap.diff(1, 3) else {
            panic!("expected change");
        };
        assert_eq!((delta.previous, delta.current, delta.difference), (0, 3, 3));
    }

    #[test]
    fn snapshot_detects_change_sequence() {
        let mut snap = MetricSnapshot::new();

        // Cycle 1: never seen, value 7 -> change with zero baseline.
        let Some(first) = snap.diff(1, 7) else {
            panic!("expected change");
        };
        assert_eq!((first.previous, first.current, first.difference), (0, 7, 7));
        snap.commit(1, 7);

        // Cycle 2: still 7 -> no change.
        assert!(snap.diff(1, 7).is_none());
        snap.commit(1, 7);

        // Cycle 3: 10 -> change from 7.
        let Some(third) = snap.diff(1, 10) else {
            panic!("expected change");
        };
        assert_eq!(
            (third.previous, third.current, third.difference),
            (7, 10, 3)
        );
    }

    #[test]
    fn uncommitted_diff_is_redetected() {
        let mut snap = MetricSnapshot::new();
        snap.commit(1, 7);

        // Dispatch failed: the detector does not commit, so the same
        // change shows up again.
        assert!(snap.diff(1, 10).is_some());
        assert!(snap.diff(1, 10).is_some());

        snap.commit(1, 10);
        assert!(snap.diff(1, 10).is_none());
    }

    #[test]
    fn len_and_is_empty() {
        let mut snap = MetricSnapshot::new();
        assert!(snap.is_empty());
        snap.commit(1, 1);
        snap.commit(2, 2);
        assert_eq!(snap.len(), 2);
    }
}
