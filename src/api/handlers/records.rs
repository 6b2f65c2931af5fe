//! Record CRUD handlers: list, fetch, create, update, delete.
//!
//! The table segment of every path is parsed through [`TableName`]
//! before it can reach a query, so an invalid or hostile identifier
//! fails with a 400 and never touches the database.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{ListRecordsParams, RecordListResponse};
use crate::app_state::AppState;
use crate::domain::{RecordKey, TableName};
use crate::error::{ErrorResponse, GatewayError};

/// Resolves the record key for a mutating endpoint, which accepts
/// numeric ids only.
fn require_id(key: &RecordKey) -> Result<i64, GatewayError> {
    key.as_id().ok_or_else(|| {
        GatewayError::InvalidRequest("this endpoint requires a numeric record id".to_string())
    })
}

/// `GET /tables/{table}/records` — List rows of a table.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidTableName`] for a bad table segment,
/// [`GatewayError::Database`] on query failure.
#[utoipa::path(
    get,
    path = "/api/v1/tables/{table}/records",
    tag = "Records",
    summary = "List records",
    description = "Returns rows of the given table in id order with limit/offset paging.",
    params(
        ("table" = String, Path, description = "Source table name"),
        ListRecordsParams,
    ),
    responses(
        (status = 200, description = "Page of records", body = RecordListResponse),
        (status = 400, description = "Invalid table name", body = ErrorResponse),
    )
)]
pub async fn list_records(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(params): Query<ListRecordsParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let table = TableName::parse(&table)?;
    let params = params.clamped();
    let data = state.records.list(&table, params.limit, params.offset).await?;

    Ok(Json(RecordListResponse {
        count: data.len(),
        data,
        limit: params.limit,
        offset: params.offset,
    }))
}

/// `POST /tables/{table}/records` — Insert a row.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidTableName`] or
/// [`GatewayError::InvalidRequest`] for bad input,
/// [`GatewayError::Database`] on query failure.
#[utoipa::path(
    post,
    path = "/api/v1/tables/{table}/records",
    tag = "Records",
    summary = "Create a record",
    description = "Inserts a row from a JSON object payload. A client-supplied `id` is ignored; the database assigns it. Returns the stored row.",
    params(
        ("table" = String, Path, description = "Source table name"),
    ),
    request_body = serde_json::Value,
    responses(
        (status = 201, description = "Record created", body = serde_json::Value),
        (status = 400, description = "Invalid table name or payload", body = ErrorResponse),
    )
)]
pub async fn create_record(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Json(payload): Json<serde_json::Value>,
) -> Result<impl IntoResponse, GatewayError> {
    let table = TableName::parse(&table)?;
    let row = state.records.insert(&table, &payload).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `GET /tables/{table}/records/{key}` — Fetch one row by id or token.
///
/// # Errors
///
/// Returns [`GatewayError::RecordNotFound`] when no row matches.
#[utoipa::path(
    get,
    path = "/api/v1/tables/{table}/records/{key}",
    tag = "Records",
    summary = "Get a record",
    description = "Fetches one row. A numeric key is treated as the primary id; any other key is matched against the configured token column.",
    params(
        ("table" = String, Path, description = "Source table name"),
        ("key" = String, Path, description = "Numeric id or secondary token"),
    ),
    responses(
        (status = 200, description = "The record", body = serde_json::Value),
        (status = 404, description = "Record not found", body = ErrorResponse),
    )
)]
pub async fn get_record(
    State(state): State<AppState>,
    Path((table, key)): Path<(String, String)>,
) -> Result<impl IntoResponse, GatewayError> {
    let table = TableName::parse(&table)?;
    let key = RecordKey::parse(&key)?;
    let row = state.records.fetch(&table, &key).await?;
    Ok(Json(row))
}

/// `PUT /tables/{table}/records/{key}` — Update a row by id.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for a non-numeric key or bad
/// payload, [`GatewayError::RecordNotFound`] when the id does not exist.
#[utoipa::path(
    put,
    path = "/api/v1/tables/{table}/records/{key}",
    tag = "Records",
    summary = "Update a record",
    description = "Updates the payload's columns on the row with the given numeric id and returns the updated row. Token keys are not accepted here.",
    params(
        ("table" = String, Path, description = "Source table name"),
        ("key" = i64, Path, description = "Numeric record id"),
    ),
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Updated record", body = serde_json::Value),
        (status = 400, description = "Invalid key or payload", body = ErrorResponse),
        (status = 404, description = "Record not found", body = ErrorResponse),
    )
)]
pub async fn update_record(
    State(state): State<AppState>,
    Path((table, key)): Path<(String, String)>,
    Json(payload): Json<serde_json::Value>,
) -> Result<impl IntoResponse, GatewayError> {
    let table = TableName::parse(&table)?;
    let id = require_id(&RecordKey::parse(&key)?)?;
    let row = state.records.update(&table, id, &payload).await?;
    Ok(Json(row))
}

/// `DELETE /tables/{table}/records/{key}` — Delete a row by id.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for a non-numeric key,
/// [`GatewayError::RecordNotFound`] when the id does not exist.
#[utoipa::path(
    delete,
    path = "/api/v1/tables/{table}/records/{key}",
    tag = "Records",
    summary = "Delete a record",
    description = "Deletes the row with the given numeric id. Token keys are not accepted here.",
    params(
        ("table" = String, Path, description = "Source table name"),
        ("key" = i64, Path, description = "Numeric record id"),
    ),
    responses(
        (status = 204, description = "Record deleted"),
        (status = 400, description = "Invalid key", body = ErrorResponse),
        (status = 404, description = "Record not found", body = ErrorResponse),
    )
)]
pub async fn delete_record(
    State(state): State<AppState>,
    Path((table, key)): Path<(String, String)>,
) -> Result<impl IntoResponse, GatewayError> {
    let table = TableName::parse(&table)?;
    let id = require_id(&RecordKey::parse(&key)?)?;
    state.records.delete(&table, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Record CRUD routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/tables/{table}/records",
            get(list_records).post(create_record),
        )
        .route(
            "/tables/{table}/records/{key}",
            get(get_record).put(update_record).delete(delete_record),
        )
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn require_id_accepts_numeric_key() {
        let Ok(key) = RecordKey::parse("42") else {
            panic!("numeric key should parse");
        };
        assert_eq!(require_id(&key).ok(), Some(42));
    }

    #[test]
    fn require_id_rejects_token_key() {
        let Ok(key) = RecordKey::parse("abc123") else {
            panic!("token key should parse");
        };
        assert!(require_id(&key).is_err());
    }
}
