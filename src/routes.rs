//! Route definitions and router setup
//!
//! Configures all API routes and middleware.

mod datamodel;
mod scan;

use crate::config::Settings;
use crate::state::SharedState;
use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::MakeRequestUuid,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
    ServiceBuilderExt,
};
use tracing::Level;

/// Create the application router with all routes and middleware
pub fn create_router(state: SharedState, settings: &Settings) -> Router {
    let cors = build_cors_layer(settings);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let middleware = ServiceBuilder::new()
        .set_x_request_id(MakeRequestUuid)
        .layer(trace_layer)
        .layer(CompressionLayer::new())
        .layer(cors)
        .propagate_x_request_id();

    Router::new()
        .route("/health", get(health_check))

        // Schema registry
        .route("/api/datamodel", get(datamodel::summary))
        .route("/api/datamodel/tables", get(datamodel::list_tables))
        .route("/api/datamodel/tables/{name}", get(datamodel::get_table))
        .route("/api/datamodel/tables/{name}/primary-key", get(datamodel::get_primary_key))
        .route("/api/datamodel/tables/{name}/neighbors", get(datamodel::get_neighbors))
        .route("/api/datamodel/tables/{name}/referencing", get(datamodel::get_referencing))
        .route("/api/datamodel/table-numbers/{number}", get(datamodel::get_table_by_number))
        .route("/api/datamodel/path", get(datamodel::find_path))

        // Scans and partition duplication
        .route("/api/scans", post(scan::create_scan))
        .route("/api/partitions/{id}/duplication-plan", get(scan::duplication_plan))
        .route("/api/partitions/{id}/duplication-scan", post(scan::duplication_scan))

        .layer(middleware)
        .with_state(state)
}

/// Build CORS layer from settings
fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<_> = settings
        .cors
        .allowed_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600));

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}

/// Health check endpoint
async fn health_check(
    axum::extract::State(state): axum::extract::State<SharedState>,
) -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "success": true,
        "message": "Server is running fine.",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "tables": state.datamodel.len(),
        "database": state.db_pool.is_some()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datamodel::catalog::research_catalog;
    use crate::datamodel::Datamodel;
    use crate::state::AppState;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        let datamodel = Arc::new(Datamodel::build(research_catalog(), 10).unwrap());
        let state = Arc::new(AppState::new(datamodel, None));
        create_router(state, &Settings::default())
    }

    async fn get(uri: &str) -> (StatusCode, Value) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        read(response).await
    }

    async fn post_json(uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        read(response).await
    }

    async fn read(response: axum::response::Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tables"], 26);
        assert_eq!(body["database"], false);
    }

    #[tokio::test]
    async fn test_summary_and_listing() {
        let (status, body) = get("/api/datamodel").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["tableCount"], 26);

        let (_, body) = get("/api/datamodel/tables").await;
        assert_eq!(body["data"]["tables"][0]["name"], "users");
        assert_eq!(body["data"]["tables"][0]["number"], 1);
    }

    #[tokio::test]
    async fn test_table_lookups() {
        let (status, body) = get("/api/datamodel/tables/taxa").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["number"], 6);

        let (status, body) = get("/api/datamodel/table-numbers/19").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "taxa_x_partitions");

        let (_, body) = get("/api/datamodel/tables/taxa/primary-key").await;
        assert_eq!(body["data"]["primaryKey"], serde_json::json!(["taxon_id"]));

        let (_, body) = get("/api/datamodel/tables/partitions/referencing").await;
        assert_eq!(
            body["data"]["tables"],
            serde_json::json!(["taxa_x_partitions", "characters_x_partitions"])
        );
    }

    #[tokio::test]
    async fn test_unknown_table_is_not_found() {
        let (status, body) = get("/api/datamodel/tables/ghosts/neighbors").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "UNKNOWN_TABLE");

        let (status, _) = get("/api/datamodel/table-numbers/999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_path_endpoint() {
        let (status, body) = get("/api/datamodel/path?from=taxa&to=partitions").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["data"]["path"],
            serde_json::json!(["taxa", "taxa_x_partitions", "partitions"])
        );

        let (status, body) = get("/api/datamodel/path?from=users&to=taxa").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "NO_PATH");
    }

    #[tokio::test]
    async fn test_duplication_plan() {
        let (status, body) = get("/api/partitions/12/duplication-plan").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["rootTable"], "partitions");
        assert_eq!(body["data"]["rootId"], 12);
        assert_eq!(
            body["data"]["numberedTables"],
            serde_json::json!(["matrix_taxa_order", "matrix_character_order"])
        );
        assert_eq!(body["data"]["statements"][0]["table"], "partitions");
    }

    #[tokio::test]
    async fn test_scan_endpoint() {
        let (status, body) = post_json(
            "/api/scans",
            serde_json::json!({"rootTable": "taxa", "rootId": 3}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["duplicatedTables"][0], "taxa");

        let (status, _) = post_json(
            "/api/scans",
            serde_json::json!({"rootTable": "taxa", "rootId": 0}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_duplication_scan_requires_database() {
        let (status, body) = post_json(
            "/api/partitions/12/duplication-scan",
            serde_json::json!({"projectId": 4}),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "NOT_CONNECTED");
    }
}
