use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use bytes::Bytes;
use futures::StreamExt;
use serde_json::Value;
use tower::ServiceExt;

use ex314_api::{build_router, config::Config, state::AppState};
use ex314_context::TrailingWindowStrategy;
use ex314_llm::{ChatClient, ChatRequest, ChatResponse, LlmError, StreamFormat, UpstreamReply};
use ex314_persist::MemoryStore;

const TEST_CONFIG: &str = r#"
    [server]
    host = "127.0.0.1"
    port = 0

    [cors]
    enabled = true
    origins = ["*"]

    [llm]
    provider = "relay"
    model = "ex314-test"
    url = "http://upstream.invalid/api/langchain"

    [[auth.users]]
    username = "demo"
    password = "password"

    [[auth.users]]
    username = "other"
    password = "password"

    [[auth.users]]
    username = "admin"
    password = "admin"
    admin = true

    [logging]
    level = "debug"
    format = "pretty"
"#;

/// Upstream stand-in replaying fixed chunks
pub struct ScriptedClient {
    pub chunks: Vec<&'static str>,
    pub status: u16,
    /// Keep the body open after the last chunk until cancelled
    pub hold_open: bool,
    /// End the body with a transport error after the last chunk
    pub breaks: bool,
}

impl ScriptedClient {
    pub fn replying(chunks: Vec<&'static str>) -> Self {
        Self {
            chunks,
            status: 200,
            hold_open: false,
            breaks: false,
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            chunks: Vec::new(),
            status,
            hold_open: false,
            breaks: false,
        }
    }

    pub fn held_open(chunks: Vec<&'static str>) -> Self {
        Self {
            chunks,
            status: 200,
            hold_open: true,
            breaks: false,
        }
    }

    pub fn breaking(chunks: Vec<&'static str>) -> Self {
        Self {
            chunks,
            status: 200,
            hold_open: false,
            breaks: true,
        }
    }
}

#[async_trait]
impl ChatClient for ScriptedClient {
    async fn chat(&self, request: ChatRequest) -> ex314_llm::Result<ChatResponse> {
        Ok(ChatResponse {
            content: format!("echo: {}", request.prompt().unwrap_or_default()),
            usage: None,
            finish_reason: Some("stop".to_string()),
        })
    }

    async fn chat_stream(&self, _request: ChatRequest) -> ex314_llm::Result<UpstreamReply> {
        if self.status != 200 {
            return Ok(UpstreamReply::new(self.status, None, StreamFormat::PlainText));
        }

        let mut chunks: Vec<ex314_llm::Result<Bytes>> = self
            .chunks
            .iter()
            .map(|c| Ok(Bytes::from_static(c.as_bytes())))
            .collect();
        if self.breaks {
            chunks.push(Err(LlmError::Decode("connection reset".to_string())));
        }
        let body = futures::stream::iter(chunks);
        let body = if self.hold_open {
            body.chain(futures::stream::pending()).boxed()
        } else {
            body.boxed()
        };

        Ok(UpstreamReply::new(200, Some(body), StreamFormat::PlainText))
    }
}

pub fn test_app(client: ScriptedClient) -> Router {
    let config = Config::from_toml_str(TEST_CONFIG).expect("test config");
    let context = TrailingWindowStrategy::new(10, 8000).expect("tokenizer");
    let state = AppState::new(
        config,
        Arc::new(MemoryStore::new()),
        Arc::new(client),
        Arc::new(context),
    );
    build_router(Arc::new(state))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("json body")
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

pub async fn send(app: &Router, req: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(req).await.expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    send(app, request(method, uri, token, body)).await
}

pub async fn login(app: &Router, username: &str, password: &str) -> String {
    let res = call(
        app,
        "POST",
        "/auth/login",
        None,
        Some(serde_json::json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK, "login failed: {}", res.text());
    res.json()["token"].as_str().expect("token").to_string()
}

pub async fn create_thread(app: &Router, token: &str) -> String {
    let res = call(app, "POST", "/threads", Some(token), Some(serde_json::json!({}))).await;
    assert_eq!(res.status, StatusCode::CREATED);
    res.json()["thread_id"].as_str().expect("thread id").to_string()
}

/// Names of the SSE events in a body, in order
pub fn event_names(body: &str) -> Vec<String> {
    body.lines()
        .filter_map(|line| line.strip_prefix("event:"))
        .map(|name| name.trim().to_string())
        .collect()
}

/// Parsed `data:` payloads of the SSE events in a body, in order
pub fn event_payloads(body: &str) -> Vec<Value> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .filter_map(|data| serde_json::from_str(data.trim()).ok())
        .collect()
}
