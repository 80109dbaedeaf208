use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::handlers::stream;
use crate::routes::{admin, auth, chat, health, messages, search, settings, threads};

#[derive(OpenApi)]
#[openapi(
    info(title = "EX314 API", description = "Chat backend with streamed replies"),
    paths(
        health::health_check,
        auth::login,
        auth::logout,
        chat::chat,
        stream::chat_stream,
        threads::create_thread,
        threads::list_threads,
        threads::get_thread,
        threads::update_thread,
        threads::delete_thread,
        messages::list_messages,
        messages::replace_messages,
        messages::cancel_reply,
        stream::send_message_stream,
        search::search,
        settings::get_settings,
        settings::save_settings,
        admin::export,
        admin::stats,
    ),
    components(schemas(
        health::HealthResponse,
        auth::LoginRequest,
        auth::LoginResponse,
        chat::ContextMessage,
        chat::ChatBody,
        chat::ChatReply,
        threads::CreateThreadRequest,
        threads::UpdateThreadRequest,
        threads::ThreadResponse,
        threads::ListThreadsResponse,
        messages::MessageResponse,
        messages::ListMessagesResponse,
        messages::MessageInput,
        messages::ReplaceMessagesRequest,
        stream::SendMessageRequest,
        search::SearchResult,
        search::SearchResponse,
        settings::SettingsBody,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "chat"),
        (name = "threads"),
        (name = "messages"),
        (name = "search"),
        (name = "settings"),
        (name = "admin", description = "Admin-only reports")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}
