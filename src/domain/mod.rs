//! Domain layer: core types for change tracking and notification.
//!
//! This module contains validated identifiers, the watched-table
//! configuration model, change events, the in-memory mirror of tracking
//! state, and the broadcast bus used by the synchronous insert hook.

pub mod change_event;
pub mod event_bus;
pub mod ident;
pub mod mirror;
pub mod record_key;
pub mod watch;

pub use change_event::{ChangeEvent, MetricDelta};
pub use event_bus::EventBus;
pub use ident::{ColumnName, TableName};
pub use mirror::{MetricSnapshot, WatermarkCache};
pub use record_key::RecordKey;
pub use watch::{DetectionMode, WatchedTable};
