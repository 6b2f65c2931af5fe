//! Tracking administration handlers: inspect state, force a cycle,
//! reset watermarks.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};

use crate::api::dto::{
    TrackingEntryDto, TrackingStateResponse, WatermarkResetRequest, WatermarkResetResponse,
};
use crate::app_state::AppState;
use crate::domain::TableName;
use crate::error::{ErrorResponse, GatewayError};
use crate::service::{CycleReport, ResetTarget};

/// `GET /tracking` — Tracking state for every registered table.
///
/// # Errors
///
/// Returns [`GatewayError::Database`] on query failure.
#[utoipa::path(
    get,
    path = "/api/v1/tracking",
    tag = "Tracking",
    summary = "Inspect tracking state",
    description = "Returns the durable watermark, the in-memory cached watermark, and the last check time for every registered table.",
    responses(
        (status = 200, description = "Tracking state", body = TrackingStateResponse),
    )
)]
pub async fn get_tracking_state(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, GatewayError> {
    let entries = state.tracking.load_all().await?;
    let cached = state.detector.cached_watermarks().await;

    let tables = entries
        .into_iter()
        .map(|e| TrackingEntryDto {
            cached_watermark: cached.get(&e.table_name).copied(),
            table_name: e.table_name,
            last_processed_id: e.last_processed_id,
            last_check_time: e.last_check_time,
        })
        .collect();

    Ok(Json(TrackingStateResponse { tables }))
}

/// `POST /tracking/poll` — Force a detection cycle now.
#[utoipa::path(
    post,
    path = "/api/v1/tracking/poll",
    tag = "Tracking",
    summary = "Force a detection cycle",
    description = "Runs one detection cycle immediately, queued behind any cycle already in flight, and returns the per-table report.",
    responses(
        (status = 200, description = "Cycle report", body = CycleReport),
    )
)]
pub async fn force_cycle(State(state): State<AppState>) -> Json<CycleReport> {
    Json(state.detector.run_cycle().await)
}

/// `PUT /tracking/{table}/watermark` — Reset a table's watermark.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] when the body selects
/// neither or both reset modes, [`GatewayError::TrackingNotFound`] for
/// an unregistered table.
#[utoipa::path(
    put,
    path = "/api/v1/tracking/{table}/watermark",
    tag = "Tracking",
    summary = "Reset a watermark",
    description = "Sets a table's watermark to an explicit value (replaying rows above it on the next cycle) or to the table's current maximum id (skipping the backlog). Bypasses the monotonic advancement guard.",
    params(
        ("table" = String, Path, description = "Registered table name"),
    ),
    request_body = WatermarkResetRequest,
    responses(
        (status = 200, description = "Watermark reset", body = WatermarkResetResponse),
        (status = 400, description = "Invalid request body", body = ErrorResponse),
        (status = 404, description = "Table not registered", body = ErrorResponse),
    )
)]
pub async fn reset_watermark(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Json(req): Json<WatermarkResetRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let table = TableName::parse(&table)?;

    let target = match (req.value, req.to_current_max) {
        (Some(value), false) => ResetTarget::Explicit(value),
        (None, true) => ResetTarget::CurrentMax,
        (Some(_), true) => {
            return Err(GatewayError::InvalidRequest(
                "provide either value or to_current_max, not both".to_string(),
            ));
        }
        (None, false) => {
            return Err(GatewayError::InvalidRequest(
                "provide value or set to_current_max".to_string(),
            ));
        }
    };

    let watermark = state.detector.reset_watermark(&table, target).await?;
    tracing::info!(table = %table, watermark, "watermark reset by operator");

    Ok(Json(WatermarkResetResponse {
        table_name: table.as_str().to_string(),
        watermark,
    }))
}

/// Tracking administration routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tracking", get(get_tracking_state))
        .route("/tracking/poll", post(force_cycle))
        .route("/tracking/{table}/watermark", put(reset_watermark))
}
