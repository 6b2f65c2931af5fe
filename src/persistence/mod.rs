//! Persistence layer: watermark tracking store and dynamic row access.
//!
//! Two stores share one `sqlx::PgPool`: [`TrackingStore`] owns the
//! durable `watched_tables` watermark table, and [`RecordStore`] runs
//! the dynamic (identifier-validated) queries for the CRUD passthrough
//! and the change detector.

pub mod models;
pub mod records;
pub mod tracking;

pub use models::{DetectedRow, TrackingEntry};
pub use records::RecordStore;
pub use tracking::TrackingStore;
