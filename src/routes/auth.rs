//! Registration, login and session endpoints

use axum::{
    Json, Router,
    extract::{FromRequestParts, State},
    http::{StatusCode, request::Parts},
    routing::post,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};

use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    // Rate limit the credential endpoints to slow brute force attempts
    let rate_limit_config = GovernorConfigBuilder::default()
        .per_second(6)
        .burst_size(10)
        .key_extractor(SmartIpKeyExtractor)
        .finish()
        .expect("Failed to build rate limit config");

    let rate_limit_layer = GovernorLayer {
        config: rate_limit_config.into(),
    };

    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .layer(rate_limit_layer)
}

// ============================================================================
// Auth extractor - validates the session token header
// ============================================================================

/// Extractor that checks the x-session-token header against the session map
/// and yields the token for store lookups.
pub struct AuthSession(pub String);

impl FromRequestParts<Arc<AppState>> for AuthSession {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get("x-session-token")
            .and_then(|v| v.to_str().ok())
            .ok_or(StatusCode::UNAUTHORIZED)?;

        if state.users.username_for_token(token).is_none() {
            return Err(StatusCode::UNAUTHORIZED);
        }

        Ok(AuthSession(token.to_string()))
    }
}

// ============================================================================
// Session endpoints
// ============================================================================

#[derive(Deserialize)]
struct Credentials {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct RegisterResponse {
    username: String,
}

#[derive(Serialize)]
struct LoginResponse {
    token: String,
    username: String,
}

/// POST /api/auth/register - Create an account
async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<Credentials>,
) -> Result<(StatusCode, Json<RegisterResponse>), StatusCode> {
    state.users.register(&req.username, &req.password).map_err(|e| {
        eprintln!("Registration rejected for '{}': {}", req.username.trim(), e);
        e.status()
    })?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            username: req.username.trim().to_string(),
        }),
    ))
}

/// POST /api/auth/login - Verify credentials and issue a session token
async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<Credentials>,
) -> Result<Json<LoginResponse>, StatusCode> {
    // Single 401 for unknown user and wrong password alike
    let token = state
        .users
        .login(&req.username, &req.password)
        .map_err(|e| e.status())?;

    let username = state
        .users
        .username_for_token(&token)
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(LoginResponse { token, username }))
}

/// POST /api/auth/logout - Drop the session (204, idempotent client-side)
async fn logout(
    State(state): State<Arc<AppState>>,
    AuthSession(token): AuthSession,
) -> StatusCode {
    state.users.logout(&token);
    StatusCode::NO_CONTENT
}
