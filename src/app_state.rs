//! Shared application state handed to every HTTP handler.

use std::sync::Arc;

use crate::persistence::TrackingStore;
use crate::service::{ChangeDetector, RecordService};

/// State shared across all routes.
#[derive(Debug, Clone)]
pub struct AppState {
    /// CRUD passthrough service.
    pub records: Arc<RecordService>,
    /// Polling change detector (also serves forced cycles and resets).
    pub detector: Arc<ChangeDetector>,
    /// Watermark store, read directly by the tracking admin endpoints.
    pub tracking: TrackingStore,
}

impl AppState {
    /// Bundles the services into one shareable state value.
    #[must_use]
    pub fn new(
        records: Arc<RecordService>,
        detector: Arc<ChangeDetector>,
        tracking: TrackingStore,
    ) -> Self {
        Self {
            records,
            detector,
            tracking,
        }
    }
}
