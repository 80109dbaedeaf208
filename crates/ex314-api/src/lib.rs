pub mod auth;
pub mod config;
pub mod docs;
pub mod error;
pub mod handlers;
pub mod inflight;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::{
    http::{HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::{
        predicate::{DefaultPredicate, NotForContentType, Predicate},
        CompressionLayer,
    },
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::Config,
    docs::ApiDoc,
    handlers::stream,
    middleware::{auth::require_session, logging},
    routes::{admin, auth as auth_routes, chat, health, messages, search, settings, threads},
    state::AppState,
};

pub fn build_router(state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/auth/login", post(auth_routes::login));

    let protected_routes = Router::new()
        .route("/auth/logout", post(auth_routes::logout))
        // Stateless chat
        .route("/chat", post(chat::chat))
        .route("/chat/stream", post(stream::chat_stream))
        // Threads
        .route("/threads", post(threads::create_thread).get(threads::list_threads))
        .route(
            "/threads/:thread_id",
            get(threads::get_thread)
                .patch(threads::update_thread)
                .delete(threads::delete_thread),
        )
        // Messages
        .route(
            "/threads/:thread_id/messages",
            get(messages::list_messages)
                .put(messages::replace_messages)
                .post(stream::send_message_stream),
        )
        .route("/threads/:thread_id/cancel", post(messages::cancel_reply))
        // Search & settings
        .route("/search", get(search::search))
        .route("/settings", get(settings::get_settings).put(settings::save_settings))
        // Admin
        .route("/admin/export", get(admin::export))
        .route("/admin/stats", get(admin::stats))
        .route_layer(from_fn_with_state(Arc::clone(&state), require_session));

    // streamed plain-text replies must reach the client chunk by chunk
    let compression = CompressionLayer::new()
        .compress_when(DefaultPredicate::new().and(NotForContentType::new("text/plain")));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()))
        .layer(from_fn(logging::log_request))
        .layer(TimeoutLayer::new(Duration::from_secs(
            state.config.server.request_timeout_secs,
        )))
        .layer(compression)
        .layer(build_cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub fn build_cors_layer(config: &Config) -> CorsLayer {
    if config.cors.enabled {
        let cors = CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers(Any);

        if config.cors.origins.iter().any(|o| o == "*") {
            cors.allow_origin(Any)
        } else {
            let parsed_origins: Vec<HeaderValue> = config
                .cors
                .origins
                .iter()
                .filter_map(|o| o.parse::<HeaderValue>().ok())
                .collect();

            cors.allow_origin(parsed_origins)
        }
    } else {
        CorsLayer::permissive()
    }
}
