//! Content endpoints backed by the aggregator.
//!
//! These always answer 200 with a well-formed JSON body: upstream trouble of
//! any kind shows up as fewer or zero results, never as an error page. The
//! empty-state is the front end's job to render.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::AppState;
use crate::aggregator::{self, NormalizedVideo};
use crate::constants::{MAX_PER_PAGE, RELATED_ORDER, TRENDING_ORDER};
use crate::upstream::{DEFAULT_ORDER, ORDER_KEYS};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/data", get(get_data))
        .route("/api/trending", get(get_trending))
        .route("/api/related", get(get_related))
}

#[derive(Debug, Deserialize)]
pub struct DataQuery {
    pub q: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    pub order: Option<String>,
    pub per_page: Option<u32>,
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Debug, Deserialize)]
pub struct RelatedQuery {
    pub q: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
}

fn default_page() -> u32 {
    1
}

#[derive(Debug, Serialize)]
pub struct DataResponse {
    pub videos: Vec<NormalizedVideo>,
    pub total: u64,
    pub page: u32,
}

#[derive(Debug, Serialize)]
pub struct VideosResponse {
    pub videos: Vec<NormalizedVideo>,
}

/// GET /api/data?q=&page=&order=&per_page=&refresh= - Search/browse feed.
///
/// Fetches a window of upstream pages starting at `page`, wide as the
/// configured fan-out. `refresh=true` bypasses the cache read.
async fn get_data(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DataQuery>,
) -> Json<DataResponse> {
    let term = term_or_default(query.q.as_deref(), &state);
    let order = query.order.unwrap_or_else(|| DEFAULT_ORDER.to_string());
    if !ORDER_KEYS.contains(&order.as_str()) {
        // passed through verbatim; the upstream rejects it on its own terms
        eprintln!("Unrecognized order key '{}' for '{}'", order, term);
    }
    let per_page = query
        .per_page
        .unwrap_or(state.config.default_per_page)
        .clamp(1, MAX_PER_PAGE);
    let page = query.page.max(1);

    let (videos, total) = aggregator::load_content_cached(
        &state.search,
        &state.cache,
        &term,
        page,
        state.config.fetch_pages,
        &order,
        per_page,
        state.config.shuffle_results,
        query.refresh,
    )
    .await;

    Json(DataResponse { videos, total, page })
}

/// GET /api/trending - Editorial feed: default category, weekly top order.
async fn get_trending(State(state): State<Arc<AppState>>) -> Json<VideosResponse> {
    let term = state.config.default_category.clone();
    let (videos, _) = aggregator::load_content_cached(
        &state.search,
        &state.cache,
        &term,
        1,
        state.config.fetch_pages,
        TRENDING_ORDER,
        state.config.default_per_page,
        state.config.shuffle_results,
        false,
    )
    .await;

    Json(VideosResponse { videos })
}

/// GET /api/related?q=&page= - Single page of popular results for a term.
async fn get_related(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RelatedQuery>,
) -> Json<VideosResponse> {
    let term = term_or_default(query.q.as_deref(), &state);
    let (videos, _) = aggregator::load_content_cached(
        &state.search,
        &state.cache,
        &term,
        query.page.max(1),
        1,
        RELATED_ORDER,
        state.config.default_per_page,
        state.config.shuffle_results,
        false,
    )
    .await;

    Json(VideosResponse { videos })
}

fn term_or_default(q: Option<&str>, state: &AppState) -> String {
    match q.map(str::trim) {
        Some(term) if !term.is_empty() => term.to_string(),
        _ => state.config.default_category.clone(),
    }
}
