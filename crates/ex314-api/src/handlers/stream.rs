use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Extension, Json,
};
use bytes::Bytes;
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_stream::wrappers::UnboundedReceiverStream;
use utoipa::ToSchema;

use ex314_llm::{ChatRequest, LlmError, StreamingReplyAssembler};
use ex314_persist::ChatMessage;

use crate::{
    auth::CurrentUser,
    error::{ApiError, ApiResult, INTERRUPTED_NOTICE, UNAVAILABLE_NOTICE},
    inflight::InflightGuard,
    routes::{chat::ChatBody, messages::MessageResponse, threads::owned_thread},
    state::AppState,
};

const CANCELLED_NOTICE: &str = "The AI response was cancelled.";

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    pub content: String,
}

/// Events of a thread send, in order: any number of `delta`, then one `done` or `error`
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ReplyEvent {
    Delta {
        fragment: String,
        content: String,
    },
    Done {
        message: MessageResponse,
    },
    Error {
        message: String,
        reason: FailureReason,
        partial: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureReason {
    Unavailable,
    Interrupted,
    Cancelled,
}

impl ReplyEvent {
    fn failed(error: &LlmError) -> Self {
        let partial = error.partial().unwrap_or_default().to_string();
        let (message, reason) = match error {
            LlmError::Cancelled { .. } => (CANCELLED_NOTICE, FailureReason::Cancelled),
            LlmError::StreamInterrupted { .. } => (INTERRUPTED_NOTICE, FailureReason::Interrupted),
            _ => (UNAVAILABLE_NOTICE, FailureReason::Unavailable),
        };
        Self::Error {
            message: message.to_string(),
            reason,
            partial,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Delta { .. } => "delta",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }

    fn into_sse(self) -> Event {
        let name = self.name();
        Event::default().event(name).json_data(&self).unwrap_or_else(|e| {
            tracing::error!(error = %e, event = name, "Failed to encode SSE event");
            Event::default().event("error").data(UNAVAILABLE_NOTICE)
        })
    }
}

/// Send a message and stream the response using Server-Sent Events
///
/// The user message is stored before the upstream call; the assistant message is
/// stored only when the reply completes.
#[utoipa::path(
    post,
    path = "/threads/{thread_id}/messages",
    params(
        ("thread_id" = String, Path, description = "Thread ID")
    ),
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Streaming response", content_type = "text/event-stream"),
        (status = 400, description = "Empty message"),
        (status = 404, description = "Thread not found"),
        (status = 409, description = "A reply is already streaming into this thread")
    ),
    security(("bearer" = [])),
    tag = "messages"
)]
pub async fn send_message_stream(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(thread_id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    if req.content.trim().is_empty() {
        return Err(ApiError::BadRequest("content must not be empty".to_string()));
    }

    // 1. Ownership and the per-thread slot
    owned_thread(&state, &user, &thread_id).await?;
    let guard = state
        .inflight
        .begin(&thread_id)
        .ok_or_else(|| ApiError::Conflict("a reply is already in progress for this thread".to_string()))?;

    // 2. Store the user message
    state
        .persist
        .save_message(&thread_id, ChatMessage::user(req.content))
        .await?;

    // 3. Context window, system prompt in the user's tone
    let settings = state.persist.get_settings(&user.user_id).await?;
    let window = state
        .context
        .get_context_window(&thread_id, state.persist.as_ref(), &settings.ai_tone)
        .await?;
    let request = state.chat_request(window.into_messages());

    tracing::info!(
        thread_id = %thread_id,
        messages = request.messages.len(),
        "Streaming reply"
    );

    // 4. Assemble in the background; the receiver feeds the SSE body
    let (tx, mut rx) = mpsc::unbounded_channel::<ReplyEvent>();
    tokio::spawn(run_reply(Arc::clone(&state), request, guard, tx));

    let events = async_stream::stream! {
        while let Some(event) = rx.recv().await {
            yield Ok::<Event, Infallible>(event.into_sse());
        }
    };
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

async fn run_reply(
    state: Arc<AppState>,
    request: ChatRequest,
    guard: InflightGuard,
    tx: UnboundedSender<ReplyEvent>,
) {
    let thread_id = guard.thread_id().to_string();
    let token = guard.token();

    let reply = tokio::select! {
        _ = token.cancelled() => Err(LlmError::Cancelled { partial: String::new() }),
        reply = state.llm_client.chat_stream(request) => reply,
    };

    let outcome = match reply {
        Ok(reply) => {
            let mut assembler = StreamingReplyAssembler::new().with_cancellation(token.clone());
            let assembled = assembler.assemble(reply, |fragment, content| {
                let _ = tx.send(ReplyEvent::Delta {
                    fragment: fragment.to_string(),
                    content: content.to_string(),
                });
            });

            tokio::select! {
                result = assembled => result,
                _ = tx.closed() => {
                    token.cancel();
                    tracing::info!(thread_id = %thread_id, "Client disconnected, reply abandoned");
                    return;
                }
            }
        }
        Err(e) => Err(e),
    };

    let event = match outcome {
        Ok(content) => {
            let message = ChatMessage::assistant(content);
            if let Err(e) = state.persist.save_message(&thread_id, message.clone()).await {
                tracing::error!(thread_id = %thread_id, error = %e, "Failed to store assistant message");
            }
            tracing::info!(thread_id = %thread_id, chars = message.content.chars().count(), "Reply completed");
            ReplyEvent::Done {
                message: message.into(),
            }
        }
        Err(e) => {
            tracing::warn!(thread_id = %thread_id, error = %e, "Reply failed");
            ReplyEvent::failed(&e)
        }
    };

    // release the thread before the client can react to the final event
    drop(guard);
    let _ = tx.send(event);
}

/// Proxy a reply as a chunked plain-text body
#[utoipa::path(
    post,
    path = "/chat/stream",
    request_body = ChatBody,
    responses(
        (status = 200, description = "Reply text as it arrives", content_type = "text/plain"),
        (status = 400, description = "Empty message or invalid role"),
        (status = 502, description = "Upstream error")
    ),
    security(("bearer" = [])),
    tag = "chat"
)]
pub async fn chat_stream(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatBody>,
) -> ApiResult<Response> {
    let messages = body.into_messages(&state)?;

    let reply = state
        .llm_client
        .chat_stream(state.chat_request(messages))
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Upstream request failed");
            ApiError::Upstream
        })?;

    if !reply.is_available() {
        tracing::warn!(status = reply.status(), "Upstream reply unavailable");
        return Err(ApiError::Upstream);
    }

    let (tx, rx) = mpsc::unbounded_channel::<Result<Bytes, io::Error>>();
    tokio::spawn(async move {
        let mut assembler = StreamingReplyAssembler::new();
        let token = assembler.cancellation_token();
        let assembled = assembler.assemble(reply, |fragment, _| {
            let _ = tx.send(Ok(Bytes::copy_from_slice(fragment.as_bytes())));
        });

        let result = tokio::select! {
            result = assembled => result,
            _ = tx.closed() => {
                token.cancel();
                tracing::debug!("Proxy client disconnected");
                return;
            }
        };

        // an errored body aborts the chunked response
        if let Err(e) = result {
            tracing::warn!(error = %e, "Proxied reply ended early");
            let _ = tx.send(Err(io::Error::other(e.to_string())));
        }
    });

    let headers = [
        (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
        (header::CACHE_CONTROL, "no-cache"),
        (header::CONNECTION, "keep-alive"),
    ];
    Ok((headers, Body::from_stream(UnboundedReceiverStream::new(rx))).into_response())
}
