//! Newspaper and article browsing.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use gazette_core::Error;
use gazette_store::{Article, ArticleRecord, Newspaper, NewspaperDetail, Page};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/newspapers", get(list_newspapers))
        .route(
            "/newspapers/{id}",
            get(get_newspaper).delete(delete_newspaper),
        )
        .route("/pages/{id}", get(get_page))
        .route("/articles/{id}", get(get_article))
}

#[derive(Debug, Serialize)]
struct PageView {
    #[serde(flatten)]
    page: Page,
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    limit: Option<usize>,
    offset: Option<usize>,
}

/// GET /api/newspapers?limit=50&offset=0: newest first.
async fn list_newspapers(
    State(state): State<Arc<AppState>>,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<Vec<Newspaper>>> {
    let newspapers = state
        .store
        .list_newspapers(page.limit.unwrap_or(50), page.offset.unwrap_or(0))?;
    Ok(Json(newspapers))
}

/// GET /api/newspapers/{id}: newspaper with its pages.
async fn get_newspaper(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<NewspaperDetail>> {
    let detail = state
        .store
        .get_newspaper_detail(id)?
        .ok_or_else(|| Error::NotFound(format!("newspaper {}", id)))?;
    Ok(Json(detail))
}

/// DELETE /api/newspapers/{id}: remove a newspaper, its pages and articles.
async fn delete_newspaper(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    if !state.store.delete_newspaper(id)? {
        return Err(Error::NotFound(format!("newspaper {}", id)).into());
    }
    let page_dir = state.pipeline.page_dir(id);
    if page_dir.exists() {
        if let Err(e) = std::fs::remove_dir_all(&page_dir) {
            warn!("Could not remove {}: {}", page_dir.display(), e);
        }
    }
    info!("Deleted newspaper {}", id);
    Ok(Json(serde_json::json!({ "success": true, "id": id })))
}

/// GET /api/pages/{id}: page with the articles segmented from it.
async fn get_page(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<PageView>> {
    let page = state
        .store
        .get_page(id)?
        .ok_or_else(|| Error::NotFound(format!("page {}", id)))?;
    let articles = state.store.articles_for_page(page.id)?;
    Ok(Json(PageView { page, articles }))
}

/// GET /api/articles/{id}: article with keywords, page and newspaper.
async fn get_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ArticleRecord>> {
    let record = state
        .store
        .get_article(id)?
        .ok_or_else(|| Error::NotFound(format!("article {}", id)))?;
    Ok(Json(record))
}
