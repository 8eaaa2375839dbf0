//! Search routes
//!
//! Entity names are matched exactly as declared in `schema.entities`.

use crate::api::handlers::search;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn search_routes() -> Router<AppState> {
    Router::new()
        .route("/:entity", get(search::search))
        .route("/:entity/:id", get(search::find_by_id))
}
