use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use ex314_persist::{ChatThread, ThreadQuery, ThreadSort, ThreadStatus, ThreadUpdate};

use crate::{
    auth::CurrentUser,
    error::{ApiError, ApiResult},
    state::AppState,
};

const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 100;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateThreadRequest {
    /// Defaults to "Untitled Chat"
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateThreadRequest {
    #[serde(default)]
    pub title: Option<String>,
    /// active, starred, archived or deleted
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ThreadResponse {
    pub thread_id: String,
    pub user_id: String,
    pub title: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListThreadsQuery {
    /// Only threads with this status
    pub status: Option<String>,
    /// Case-insensitive title filter
    pub q: Option<String>,
    /// recent, oldest or title
    pub sort: Option<String>,
    #[serde(default)]
    pub include_deleted: bool,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListThreadsResponse {
    pub threads: Vec<ThreadResponse>,
    pub has_more: bool,
}

impl From<ChatThread> for ThreadResponse {
    fn from(thread: ChatThread) -> Self {
        Self {
            thread_id: thread.id,
            user_id: thread.user_id,
            title: thread.title,
            status: thread.status.to_string(),
            created_at: thread.created_at,
            updated_at: thread.updated_at,
        }
    }
}

/// Load a thread the caller owns; someone else's thread looks missing
pub(crate) async fn owned_thread(
    state: &AppState,
    user: &CurrentUser,
    thread_id: &str,
) -> ApiResult<ChatThread> {
    state
        .persist
        .get_thread(thread_id)
        .await?
        .filter(|t| t.user_id == user.user_id)
        .ok_or_else(|| ApiError::ThreadNotFound(thread_id.to_string()))
}

fn parse_status(raw: &str) -> ApiResult<ThreadStatus> {
    ThreadStatus::from_str(raw).map_err(ApiError::BadRequest)
}

fn parse_sort(raw: &str) -> ApiResult<ThreadSort> {
    match raw.to_ascii_lowercase().as_str() {
        "recent" => Ok(ThreadSort::Recent),
        "oldest" => Ok(ThreadSort::Oldest),
        "title" => Ok(ThreadSort::Title),
        other => Err(ApiError::BadRequest(format!("unknown sort: {}", other))),
    }
}

/// Create a new thread
#[utoipa::path(
    post,
    path = "/threads",
    request_body = CreateThreadRequest,
    responses(
        (status = 201, description = "Thread created", body = ThreadResponse),
        (status = 401, description = "Missing or invalid session")
    ),
    security(("bearer" = [])),
    tag = "threads"
)]
pub async fn create_thread(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateThreadRequest>,
) -> ApiResult<(StatusCode, Json<ThreadResponse>)> {
    let thread = state.persist.create_thread(&user.user_id, req.title).await?;
    tracing::info!(thread_id = %thread.id, user_id = %user.user_id, "Thread created");

    Ok((StatusCode::CREATED, Json(thread.into())))
}

/// List the caller's threads
#[utoipa::path(
    get,
    path = "/threads",
    params(ListThreadsQuery),
    responses(
        (status = 200, description = "List of threads", body = ListThreadsResponse),
        (status = 400, description = "Invalid filter")
    ),
    security(("bearer" = [])),
    tag = "threads"
)]
pub async fn list_threads(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ListThreadsQuery>,
) -> ApiResult<Json<ListThreadsResponse>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let filter = ThreadQuery {
        status: query.status.as_deref().map(parse_status).transpose()?,
        title_contains: query.q.filter(|q| !q.trim().is_empty()),
        sort: query.sort.as_deref().map(parse_sort).transpose()?.unwrap_or_default(),
        include_deleted: query.include_deleted,
        // one extra row tells whether another page exists
        limit: Some(limit + 1),
    };

    let mut threads = state.persist.list_threads(&user.user_id, &filter).await?;
    let has_more = threads.len() > limit;
    threads.truncate(limit);

    Ok(Json(ListThreadsResponse {
        threads: threads.into_iter().map(ThreadResponse::from).collect(),
        has_more,
    }))
}

/// Get a specific thread by ID
#[utoipa::path(
    get,
    path = "/threads/{thread_id}",
    params(
        ("thread_id" = String, Path, description = "Thread ID")
    ),
    responses(
        (status = 200, description = "Thread details", body = ThreadResponse),
        (status = 404, description = "Thread not found")
    ),
    security(("bearer" = [])),
    tag = "threads"
)]
pub async fn get_thread(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<ThreadResponse>> {
    let thread = owned_thread(&state, &user, &thread_id).await?;
    Ok(Json(thread.into()))
}

/// Rename a thread or change its status (star, archive, soft-delete)
#[utoipa::path(
    patch,
    path = "/threads/{thread_id}",
    params(
        ("thread_id" = String, Path, description = "Thread ID")
    ),
    request_body = UpdateThreadRequest,
    responses(
        (status = 200, description = "Updated thread", body = ThreadResponse),
        (status = 400, description = "Unknown status"),
        (status = 404, description = "Thread not found")
    ),
    security(("bearer" = [])),
    tag = "threads"
)]
pub async fn update_thread(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(thread_id): Path<String>,
    Json(req): Json<UpdateThreadRequest>,
) -> ApiResult<Json<ThreadResponse>> {
    owned_thread(&state, &user, &thread_id).await?;

    let update = ThreadUpdate {
        title: req.title,
        status: req.status.as_deref().map(parse_status).transpose()?,
    };
    let thread = state.persist.update_thread(&thread_id, update).await?;
    tracing::info!(thread_id = %thread_id, status = %thread.status, "Thread updated");

    Ok(Json(thread.into()))
}

/// Delete a thread and its messages
#[utoipa::path(
    delete,
    path = "/threads/{thread_id}",
    params(
        ("thread_id" = String, Path, description = "Thread ID")
    ),
    responses(
        (status = 204, description = "Thread deleted"),
        (status = 404, description = "Thread not found")
    ),
    security(("bearer" = [])),
    tag = "threads"
)]
pub async fn delete_thread(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(thread_id): Path<String>,
) -> ApiResult<StatusCode> {
    owned_thread(&state, &user, &thread_id).await?;

    state.inflight.cancel(&thread_id);
    state.persist.delete_thread(&thread_id).await?;
    tracing::info!(thread_id = %thread_id, "Thread deleted");

    Ok(StatusCode::NO_CONTENT)
}
