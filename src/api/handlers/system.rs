//! System endpoints: health check.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;

/// One table's watermark as shown in the health response.
#[derive(Debug, Serialize, ToSchema)]
struct WatermarkDto {
    table_name: String,
    watermark: i64,
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
    /// When the most recent detection cycle finished, if any has run.
    #[serde(skip_serializing_if = "Option::is_none")]
    last_cycle_completed_at: Option<DateTime<Utc>>,
    /// Cached watermarks per watched table.
    watermarks: Vec<WatermarkDto>,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health, version, the completion time of the last detection cycle, and the cached watermark per watched table.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let last_cycle_completed_at = state
        .detector
        .last_report()
        .await
        .map(|report| report.finished_at);

    let mut watermarks: Vec<WatermarkDto> = state
        .detector
        .cached_watermarks()
        .await
        .into_iter()
        .map(|(table_name, watermark)| WatermarkDto {
            table_name,
            watermark,
        })
        .collect();
    watermarks.sort_by(|a, b| a.table_name.cmp(&b.table_name));

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            last_cycle_completed_at,
            watermarks,
        }),
    )
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_handler))
}
