use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    error::{ApiError, ApiResult},
    middleware::auth::bearer_token,
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: String,
    pub is_admin: bool,
    pub expires_at: DateTime<Utc>,
}

/// Exchange credentials for a session token
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session opened", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let (token, session) = state
        .sessions
        .login(&req.username, &req.password)
        .ok_or_else(|| {
            tracing::info!(username = %req.username, "Rejected login");
            ApiError::Unauthorized("invalid username or password".to_string())
        })?;

    tracing::info!(user_id = %session.user.user_id, admin = session.user.is_admin, "User logged in");

    Ok(Json(LoginResponse {
        token,
        user_id: session.user.user_id,
        is_admin: session.user.is_admin,
        expires_at: session.expires_at,
    }))
}

/// Invalidate the caller's session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Session closed"),
        (status = 401, description = "Missing or invalid session")
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> StatusCode {
    if let Some(token) = bearer_token(&headers) {
        state.sessions.logout(token);
    }
    StatusCode::NO_CONTENT
}
