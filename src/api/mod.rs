//! REST API layer: route handlers, DTOs, and router composition.
//!
//! All resource endpoints are mounted under `/api/v1`; the health check
//! lives at the root. With the `swagger-ui` feature enabled (the
//! default) the OpenAPI document is served at
//! `/api-docs/openapi.json` with an interactive UI under `/swagger-ui`.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document covering every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "rowcast-gateway",
        description = "Generic REST gateway over PostgreSQL with at-least-once change notifications"
    ),
    paths(
        handlers::records::list_records,
        handlers::records::create_record,
        handlers::records::get_record,
        handlers::records::update_record,
        handlers::records::delete_record,
        handlers::tracking::get_tracking_state,
        handlers::tracking::force_cycle,
        handlers::tracking::reset_watermark,
        handlers::system::health_handler,
    ),
    tags(
        (name = "Records", description = "Schemaless CRUD passthrough over source tables"),
        (name = "Tracking", description = "Watermark inspection and administration"),
        (name = "System", description = "Health and liveness")
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_lists_all_endpoints() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/tables/{table}/records",
            "/api/v1/tables/{table}/records/{key}",
            "/api/v1/tracking",
            "/api/v1/tracking/poll",
            "/api/v1/tracking/{table}/watermark",
            "/health",
        ] {
            assert!(
                doc.paths.paths.contains_key(path),
                "missing path {path} in OpenAPI document"
            );
        }
    }
}
