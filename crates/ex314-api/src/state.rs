use std::sync::Arc;

use ex314_context::ContextStrategy;
use ex314_llm::{ChatClient, ChatOptions, ChatRequest, Message};
use ex314_persist::PersistenceClient;

use crate::auth::SessionStore;
use crate::config::Config;
use crate::inflight::InflightRegistry;

/// Shared application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub persist: Arc<dyn PersistenceClient>,
    pub llm_client: Arc<dyn ChatClient>,
    pub context: Arc<dyn ContextStrategy>,
    pub sessions: Arc<SessionStore>,
    pub inflight: InflightRegistry,
}

impl AppState {
    pub fn new(
        config: Config,
        persist: Arc<dyn PersistenceClient>,
        llm_client: Arc<dyn ChatClient>,
        context: Arc<dyn ContextStrategy>,
    ) -> Self {
        let sessions = Arc::new(SessionStore::new(&config.auth));
        Self {
            config: Arc::new(config),
            persist,
            llm_client,
            context,
            sessions,
            inflight: InflightRegistry::new(),
        }
    }

    /// Upstream request for `messages` using the configured model and limits
    pub fn chat_request(&self, messages: Vec<Message>) -> ChatRequest {
        let mut options = ChatOptions::new();
        if let Some(temperature) = self.config.llm.temperature {
            options = options.temperature(temperature);
        }
        if let Some(max_tokens) = self.config.llm.max_tokens {
            options = options.max_tokens(max_tokens);
        }
        ChatRequest::new(self.config.llm.model.clone(), messages).with_options(options)
    }
}
