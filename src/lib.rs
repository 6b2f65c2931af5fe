//! # rowcast-gateway
//!
//! Generic REST gateway over PostgreSQL with polling-based change
//! detection and at-least-once webhook/email notifications.
//!
//! The gateway watches configured source tables for new rows (by
//! monotonic id) or changed counters (by metric column), delivers one
//! notification per change to every configured sink, and only then
//! advances a durable per-table watermark. The same service exposes a
//! schemaless CRUD passthrough over the source tables.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │       ├── RecordService (service/)
//!     │       └── ChangeDetector (service/)
//!     │
//! Poll timer ── ChangeDetector ── Dispatcher ── Webhook / Email sinks
//!     │               │
//!     │         WatermarkCache + MetricSnapshot (domain/)
//!     │               │
//!     └── PostgreSQL (source tables + watched_tables)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
