use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use ex314_persist::{ChatMessage, MessageRole};

use crate::{
    auth::CurrentUser,
    error::{ApiError, ApiResult},
    routes::threads::owned_thread,
    state::AppState,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message_id: String,
    /// user or assistant
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl From<ChatMessage> for MessageResponse {
    fn from(message: ChatMessage) -> Self {
        Self {
            message_id: message.id,
            role: message.role.as_str().to_string(),
            content: message.content,
            timestamp: message.timestamp,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListMessagesResponse {
    pub messages: Vec<MessageResponse>,
}

/// A message supplied by the client; id and timestamp are filled in when absent
#[derive(Debug, Deserialize, ToSchema)]
pub struct MessageInput {
    #[serde(default)]
    pub id: Option<String>,
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReplaceMessagesRequest {
    pub messages: Vec<MessageInput>,
}

pub(crate) fn parse_role(raw: &str) -> ApiResult<MessageRole> {
    match raw {
        "user" => Ok(MessageRole::User),
        "assistant" => Ok(MessageRole::Assistant),
        other => Err(ApiError::BadRequest(format!("invalid message role: {}", other))),
    }
}

impl TryFrom<MessageInput> for ChatMessage {
    type Error = ApiError;

    fn try_from(input: MessageInput) -> ApiResult<Self> {
        let mut message = ChatMessage::new(parse_role(&input.role)?, input.content);
        if let Some(id) = input.id.filter(|id| !id.is_empty()) {
            message.id = id;
        }
        if let Some(timestamp) = input.timestamp {
            message.timestamp = timestamp;
        }
        Ok(message)
    }
}

/// List messages in a thread, oldest first
#[utoipa::path(
    get,
    path = "/threads/{thread_id}/messages",
    params(
        ("thread_id" = String, Path, description = "Thread ID")
    ),
    responses(
        (status = 200, description = "List of messages", body = ListMessagesResponse),
        (status = 404, description = "Thread not found")
    ),
    security(("bearer" = [])),
    tag = "messages"
)]
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<ListMessagesResponse>> {
    owned_thread(&state, &user, &thread_id).await?;

    let messages = state.persist.get_messages(&thread_id).await?;

    Ok(Json(ListMessagesResponse {
        messages: messages.into_iter().map(MessageResponse::from).collect(),
    }))
}

/// Replace a thread's messages wholesale
#[utoipa::path(
    put,
    path = "/threads/{thread_id}/messages",
    params(
        ("thread_id" = String, Path, description = "Thread ID")
    ),
    request_body = ReplaceMessagesRequest,
    responses(
        (status = 200, description = "Stored messages", body = ListMessagesResponse),
        (status = 400, description = "Invalid role or duplicate message id"),
        (status = 404, description = "Thread not found"),
        (status = 409, description = "A reply is streaming into this thread")
    ),
    security(("bearer" = [])),
    tag = "messages"
)]
pub async fn replace_messages(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(thread_id): Path<String>,
    Json(req): Json<ReplaceMessagesRequest>,
) -> ApiResult<Json<ListMessagesResponse>> {
    owned_thread(&state, &user, &thread_id).await?;

    let messages = req
        .messages
        .into_iter()
        .map(ChatMessage::try_from)
        .collect::<ApiResult<Vec<_>>>()?;

    let _guard = state
        .inflight
        .begin(&thread_id)
        .ok_or_else(|| ApiError::Conflict("a reply is in progress for this thread".to_string()))?;

    state.persist.replace_messages(&thread_id, messages.clone()).await?;
    tracing::info!(thread_id = %thread_id, count = messages.len(), "Thread messages replaced");

    Ok(Json(ListMessagesResponse {
        messages: messages.into_iter().map(MessageResponse::from).collect(),
    }))
}

/// Cancel the reply currently streaming into a thread
#[utoipa::path(
    post,
    path = "/threads/{thread_id}/cancel",
    params(
        ("thread_id" = String, Path, description = "Thread ID")
    ),
    responses(
        (status = 204, description = "Reply cancelled"),
        (status = 404, description = "Thread not found or nothing in flight")
    ),
    security(("bearer" = [])),
    tag = "messages"
)]
pub async fn cancel_reply(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(thread_id): Path<String>,
) -> ApiResult<StatusCode> {
    owned_thread(&state, &user, &thread_id).await?;

    if state.inflight.cancel(&thread_id) {
        tracing::info!(thread_id = %thread_id, "Reply cancelled by client");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("no reply in flight for thread {}", thread_id)))
    }
}
