//! HTTP route handlers.

pub mod health;
pub mod newspapers;
pub mod ocr;
pub mod search;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the main Axum router with all routes.
///
/// Rendered page images are served from the processed directory under
/// `/data/images`, e.g. `/data/images/newspaper_3/page_1.png`.
pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_upload_bytes;
    let images = ServeDir::new(&state.config.data_paths.processed);
    Router::new()
        .nest("/api", api_routes())
        .nest_service("/data/images", images)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(health::routes())
        .merge(ocr::routes())
        .merge(search::routes())
        .merge(newspapers::routes())
}
