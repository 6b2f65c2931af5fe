//! DTOs for the tracking administration endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One watched table's tracking state.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TrackingEntryDto {
    /// Watched table name.
    pub table_name: String,
    /// Durable watermark: highest row id fully processed.
    pub last_processed_id: i64,
    /// In-memory mirror of the watermark; divergence from
    /// `last_processed_id` indicates a delivery or persistence problem.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_watermark: Option<i64>,
    /// When the detector last examined the table.
    pub last_check_time: DateTime<Utc>,
}

/// Response for `GET /tracking`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TrackingStateResponse {
    /// Tracking state per watched table.
    pub tables: Vec<TrackingEntryDto>,
}

/// Request body for the watermark reset endpoint.
///
/// Exactly one of the two modes applies: an explicit `value`, or
/// `to_current_max` to skip everything currently in the table.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct WatermarkResetRequest {
    /// Explicit watermark value to set.
    pub value: Option<i64>,
    /// When `true`, set the watermark to the source table's current
    /// maximum id.
    #[serde(default)]
    pub to_current_max: bool,
}

/// Response for a successful watermark reset.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WatermarkResetResponse {
    /// Table whose watermark was reset.
    pub table_name: String,
    /// Effective watermark after the reset.
    pub watermark: i64,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn reset_request_accepts_explicit_value() {
        let Ok(req) = serde_json::from_str::<WatermarkResetRequest>(r#"{"value": 42}"#) else {
            panic!("explicit value should deserialize");
        };
        assert_eq!(req.value, Some(42));
        assert!(!req.to_current_max);
    }

    #[test]
    fn reset_request_accepts_current_max_flag() {
        let Ok(req) =
            serde_json::from_str::<WatermarkResetRequest>(r#"{"to_current_max": true}"#)
        else {
            panic!("flag should deserialize");
        };
        assert_eq!(req.value, None);
        assert!(req.to_current_max);
    }
}
