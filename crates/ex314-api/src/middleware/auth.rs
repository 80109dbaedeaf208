use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::{
    auth::CurrentUser,
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Bearer token from the `Authorization` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Reject requests without a live session; handlers read the caller from
/// `Extension<CurrentUser>`
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = bearer_token(req.headers())
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;
    let user: CurrentUser = state
        .sessions
        .validate(token)
        .ok_or_else(|| ApiError::Unauthorized("invalid or expired session".to_string()))?;

    tracing::debug!(user_id = %user.user_id, "Session accepted");
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Admin-only guard for handlers
pub fn require_admin(user: &CurrentUser) -> ApiResult<()> {
    if user.is_admin {
        Ok(())
    } else {
        Err(ApiError::Forbidden("admin access required".to_string()))
    }
}
