//! Search handlers
//!
//! - `GET /api/{entity}?filters&sort_by&page&page_size` - one page of rows
//! - `GET /api/{entity}/{id}` - one row with the entity's eager joins

use crate::{
    api::headers::{extract_prefer_handling, ignored_params_value, IGNORED_PARAMS_HEADER},
    db::PgExecutor,
    state::AppState,
    Error, Result,
};
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use sieve_query::{DynamicRepository, EngineConfig, RequestParameters};

/// Engine settings for one request: the configured defaults, with the
/// unknown-parameter policy taken from `Prefer` when the client sent one.
fn engine_config(state: &AppState, headers: &HeaderMap) -> EngineConfig {
    let config = state.config.engine.clone();
    match extract_prefer_handling(headers) {
        Some(handling) => config.with_policy(handling.into()),
        None => config,
    }
}

/// Search one entity type.
///
/// Repeated parameters are rejected; dropped parameters are listed in the
/// `X-Ignored-Params` response header.
pub async fn search(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    headers: HeaderMap,
    Query(items): Query<Vec<(String, String)>>,
) -> Result<Response> {
    let params = RequestParameters::from_items(&items)?;
    let shape = state.schema.default_shape(&entity)?;

    let mut conn = state.db_pool.acquire().await?;
    let executor = PgExecutor::new(&mut conn, &state.schema);
    let mut repository = DynamicRepository::new(state.schema.as_ref(), executor)
        .with_config(engine_config(&state, &headers));

    let page = repository.find_by_params_with(&params, shape).await?;

    tracing::debug!(
        entity = %entity,
        total_count = page.total_count,
        returned = page.rows.len(),
        ignored = page.ignored_params.len(),
        "Search served"
    );

    let ignored = ignored_params_value(&page.ignored_params);
    let mut response = Json(page).into_response();
    if let Some(value) = ignored {
        response.headers_mut().insert(IGNORED_PARAMS_HEADER, value);
    }
    Ok(response)
}

/// Read one row by primary key.
pub async fn find_by_id(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, String)>,
) -> Result<Response> {
    let shape = state.schema.default_shape(&entity)?;

    let mut conn = state.db_pool.acquire().await?;
    let executor = PgExecutor::new(&mut conn, &state.schema);
    let mut repository = DynamicRepository::new(state.schema.as_ref(), executor)
        .with_config(state.config.engine.clone());

    match repository.find_by_id_with_joins(&id, shape).await? {
        Some(row) => Ok(Json(row).into_response()),
        None => Err(Error::NotFound(format!("{entity}/{id}"))),
    }
}
