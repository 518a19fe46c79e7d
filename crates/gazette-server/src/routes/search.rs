//! Article search.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use gazette_core::Error;
use gazette_resolve::{SearchEngine, SearchMode, DEFAULT_LIMIT};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/search", get(search))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
    #[serde(rename = "type")]
    mode: Option<String>,
    limit: Option<usize>,
}

/// GET /api/search?q=&type=content|keyword&limit=10 (type defaults to content)
async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<serde_json::Value>> {
    let query = params.q.unwrap_or_default();
    if query.trim().is_empty() {
        return Err(Error::Input("query parameter 'q' is required".into()).into());
    }
    let mode: SearchMode = match params.mode.as_deref() {
        Some(m) => m.parse()?,
        None => SearchMode::default(),
    };
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);

    let results = SearchEngine::new(&state.store).search(&query, mode, limit)?;
    let total = results.len();
    Ok(Json(serde_json::json!({
        "results": results,
        "total": total,
        "query": query,
        "search_type": mode,
    })))
}
