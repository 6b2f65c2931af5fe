//! Service layer: change detection, notification dispatch, and the CRUD
//! passthrough.

pub mod detector;
pub mod dispatcher;
pub mod email;
pub mod record_service;

pub use detector::{ChangeDetector, CycleReport, ResetTarget, TableCycleReport};
pub use dispatcher::{DispatchReport, Dispatcher, NotificationSink, WebhookSink};
pub use email::EmailSink;
pub use record_service::RecordService;
