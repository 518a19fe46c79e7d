//! Liveness and archive counts.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

/// GET /api/health
async fn health(State(state): State<Arc<AppState>>) -> ApiResult<Json<serde_json::Value>> {
    let stats = state.store.get_stats()?;
    Ok(Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "recognizer": state.pipeline.recognizer_name(),
        "recognizerAvailable": state.pipeline.recognizer_available(),
        "newspapers": stats.newspapers,
        "pages": stats.pages,
        "articles": stats.articles,
        "keywords": stats.keywords,
    })))
}
