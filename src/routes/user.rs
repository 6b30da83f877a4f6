//! Profile, favorites and watch-history endpoints

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::Serialize;
use std::sync::Arc;

use super::auth::AuthSession;
use crate::AppState;
use crate::aggregator::NormalizedVideo;
use crate::store::{Profile, SavedVideo};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/favorites", get(list_favorites).post(add_favorite))
        .route("/api/favorites/{id}", axum::routing::delete(remove_favorite))
        .route("/api/history", get(list_history).post(record_history))
}

#[derive(Serialize)]
struct SavedVideosResponse {
    videos: Vec<SavedVideo>,
}

/// GET /api/me - Profile for the current session
async fn get_me(
    State(state): State<Arc<AppState>>,
    AuthSession(token): AuthSession,
) -> Result<Json<Profile>, StatusCode> {
    let profile = state.users.profile(&token).map_err(|e| e.status())?;
    Ok(Json(profile))
}

/// GET /api/favorites - List the user's favorites
async fn list_favorites(
    State(state): State<Arc<AppState>>,
    AuthSession(token): AuthSession,
) -> Result<Json<SavedVideosResponse>, StatusCode> {
    let videos = state.users.favorites(&token).map_err(|e| e.status())?;
    Ok(Json(SavedVideosResponse { videos }))
}

/// POST /api/favorites - Save a video snapshot to the favorites list.
/// 201 when added, 200 when it was already there.
async fn add_favorite(
    State(state): State<Arc<AppState>>,
    AuthSession(token): AuthSession,
    Json(video): Json<NormalizedVideo>,
) -> Result<StatusCode, StatusCode> {
    let added = state
        .users
        .add_favorite(&token, video)
        .map_err(|e| e.status())?;

    Ok(if added { StatusCode::CREATED } else { StatusCode::OK })
}

/// DELETE /api/favorites/{id} - Remove a favorite by video id
async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    AuthSession(token): AuthSession,
    Path(video_id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let removed = state
        .users
        .remove_favorite(&token, &video_id)
        .map_err(|e| e.status())?;

    if !removed {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/history - Watch history, most recent first
async fn list_history(
    State(state): State<Arc<AppState>>,
    AuthSession(token): AuthSession,
) -> Result<Json<SavedVideosResponse>, StatusCode> {
    let videos = state.users.history(&token).map_err(|e| e.status())?;
    Ok(Json(SavedVideosResponse { videos }))
}

/// POST /api/history - Record a watched video
async fn record_history(
    State(state): State<Arc<AppState>>,
    AuthSession(token): AuthSession,
    Json(video): Json<NormalizedVideo>,
) -> Result<StatusCode, StatusCode> {
    state
        .users
        .record_history(&token, video)
        .map_err(|e| e.status())?;
    Ok(StatusCode::NO_CONTENT)
}
