//! API layer - routes, handlers, and middleware

pub mod handlers;
pub mod headers;
pub mod middleware;
pub mod routes;

use crate::state::AppState;
use axum::{response::IntoResponse, routing::get, Json, Router};
use serde_json::json;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let cors_origins = state.config.server.cors_origins.clone();

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", routes::search::search_routes())
        .with_state(state)
        // Applied in reverse order
        .layer(middleware::cors(&cors_origins))
        .layer(middleware::trace())
}

async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "sieve-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
