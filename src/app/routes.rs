use axum::http::header::CACHE_CONTROL;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::app::handlers;
use crate::app::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/connections", get(handlers::list_connections))
        .route("/api/connections/test", post(handlers::test_connection))
        .route("/api/connections/disconnect", post(handlers::disconnect))
        .route("/api/databases/list", post(handlers::list_databases))
        .route("/api/databases/create", post(handlers::create_database))
        .route("/api/databases/drop", post(handlers::drop_database))
        .route("/api/databases/stats", post(handlers::database_stats))
        .route("/api/collections/list", post(handlers::list_collections))
        .route("/api/collections/create", post(handlers::create_collection))
        .route("/api/collections/drop", post(handlers::drop_collection))
        .route("/api/collections/stats", post(handlers::collection_stats))
        .route("/api/documents/list", post(handlers::list_documents))
        .route("/api/documents/insert", post(handlers::insert_document))
        .route("/api/documents/update", post(handlers::update_document))
        .route("/api/documents/delete", post(handlers::delete_document))
        .route("/api/documents/export", post(handlers::export_documents))
        .route("/api/aggregate", post(handlers::run_aggregation))
        // Responses carry admin data; intermediaries must never cache them.
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
