pub mod auth;
pub mod user;
pub mod videos;

use axum::Router;
use std::sync::Arc;

use crate::AppState;

/// Build all routes for the API
pub fn build_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(videos::routes())
        .merge(auth::routes())
        .merge(user::routes())
}
