use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use std::sync::Arc;

use crate::{
    auth::CurrentUser, error::ApiResult, middleware::auth::require_admin, state::AppState,
};

pub const EXPORT_FILENAME: &str = "ex314_user_export.json";

/// Every thread with its messages, as a downloadable document
#[utoipa::path(
    get,
    path = "/admin/export",
    responses(
        (status = 200, description = "Export document", content_type = "application/json"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn export(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Response> {
    require_admin(&user)?;

    let document = state.persist.export_all().await?;
    tracing::info!(user_id = %user.user_id, threads = document.threads.len(), "Export generated");

    let disposition = format!("attachment; filename=\"{}\"", EXPORT_FILENAME);
    Ok(([(header::CONTENT_DISPOSITION, disposition)], Json(document)).into_response())
}

/// Usage totals and the most recent messages
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses(
        (status = 200, description = "Usage statistics", content_type = "application/json"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub async fn stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Response> {
    require_admin(&user)?;

    let stats = state.persist.stats().await?;
    Ok(Json(stats).into_response())
}
