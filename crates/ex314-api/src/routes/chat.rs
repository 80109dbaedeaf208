use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use ex314_llm::Message;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ContextMessage {
    /// system, user or assistant
    pub role: String,
    pub content: String,
}

/// Stateless chat: the client supplies the history
#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatBody {
    pub message: String,
    #[serde(default)]
    pub context: Vec<ContextMessage>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatReply {
    pub response: String,
}

impl TryFrom<ContextMessage> for Message {
    type Error = ApiError;

    fn try_from(message: ContextMessage) -> ApiResult<Self> {
        match message.role.as_str() {
            "system" => Ok(Message::system(message.content)),
            "user" => Ok(Message::human(message.content)),
            "assistant" => Ok(Message::ai(message.content)),
            other => Err(ApiError::BadRequest(format!("invalid message role: {}", other))),
        }
    }
}

impl ChatBody {
    /// Trimmed history followed by the prompt
    pub(crate) fn into_messages(self, state: &AppState) -> ApiResult<Vec<Message>> {
        if self.message.trim().is_empty() {
            return Err(ApiError::BadRequest("message must not be empty".to_string()));
        }

        let history = self
            .context
            .into_iter()
            .map(Message::try_from)
            .collect::<ApiResult<Vec<_>>>()?;

        let mut messages = state.context.select(history);
        messages.push(Message::human(self.message));
        Ok(messages)
    }
}

/// One-shot reply to a message with client-supplied context
#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatBody,
    responses(
        (status = 200, description = "Assistant reply", body = ChatReply),
        (status = 400, description = "Empty message or invalid role"),
        (status = 500, description = "Upstream failure")
    ),
    security(("bearer" = [])),
    tag = "chat"
)]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatBody>,
) -> ApiResult<Json<ChatReply>> {
    let messages = body.into_messages(&state)?;
    let response = state.llm_client.chat(state.chat_request(messages)).await?;

    if let Some(usage) = &response.usage {
        tracing::debug!(
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "Chat completion usage"
        );
    }

    Ok(Json(ChatReply {
        response: response.content,
    }))
}
