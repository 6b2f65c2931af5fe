//! Data Transfer Objects for REST request/response serialization.
//!
//! Record rows themselves stay schemaless (`serde_json::Value`); the
//! DTOs here shape the envelopes and the tracking admin surface.

pub mod record_dto;
pub mod tracking_dto;

pub use record_dto::*;
pub use tracking_dto::*;
