//! DTOs for the record CRUD endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Paging query parameters for record listing.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ListRecordsParams {
    /// Maximum rows to return (1..=100). Defaults to 20.
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Rows to skip. Defaults to 0.
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

impl ListRecordsParams {
    /// Clamps the parameters to their allowed ranges.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            limit: self.limit.clamp(1, 100),
            offset: self.offset.max(0),
        }
    }
}

/// Response envelope for record listing.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecordListResponse {
    /// Rows in id order, each serialized as stored.
    pub data: Vec<serde_json::Value>,
    /// Number of rows in `data`.
    pub count: usize,
    /// Limit applied to this page.
    pub limit: i64,
    /// Offset applied to this page.
    pub offset: i64,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn params_are_clamped() {
        let params = ListRecordsParams {
            limit: 5000,
            offset: -3,
        };
        let clamped = params.clamped();
        assert_eq!(clamped.limit, 100);
        assert_eq!(clamped.offset, 0);
    }

    #[test]
    fn defaults_apply_on_empty_query() {
        let Ok(params) = serde_json::from_str::<ListRecordsParams>("{}") else {
            panic!("defaults should deserialize");
        };
        assert_eq!(params.limit, 20);
        assert_eq!(params.offset, 0);
    }
}
