use std::sync::Arc;

use axum::{http::StatusCode, middleware::from_fn, routing::get, Json, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    db::WatchlistStore,
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    services::providers::{CompletionProvider, MetadataProvider},
};

pub mod dashboard;
pub mod suggestions;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn WatchlistStore>,
    pub metadata: Arc<dyn MetadataProvider>,
    pub completions: Arc<dyn CompletionProvider>,
}

/// Creates the application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard::fetch))
        .route("/suggestions", get(suggestions::fetch))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
