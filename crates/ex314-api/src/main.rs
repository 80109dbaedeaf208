use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ex314_api::{build_router, config::Config, state::AppState};
use ex314_context::{ContextStrategy, TrailingWindowStrategy};
use ex314_llm::{ChatClient, ClientFactory};
use ex314_persist::{open_store, PersistenceClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load().map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting EX314 API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    tracing::info!(provider = %config.llm.provider, model = %config.llm.model, "Initializing LLM client");
    let provider = config
        .provider_config()
        .map_err(|e| anyhow::anyhow!("Invalid LLM configuration: {}", e))?;
    let llm_client: Arc<dyn ChatClient> = ClientFactory::create_chat_client(provider)?;

    let storage = config
        .storage_environment()
        .map_err(|e| anyhow::anyhow!("Invalid storage configuration: {}", e))?;
    tracing::info!(?storage, "Opening store");
    let persist_client: Arc<dyn PersistenceClient> = open_store(&storage).await?;

    tracing::info!(
        strategy = ?config.context.strategy,
        max_messages = config.context.max_messages,
        max_tokens = config.context.max_tokens,
        "Initializing context strategy"
    );
    let context_strategy: Arc<dyn ContextStrategy> = Arc::new(
        TrailingWindowStrategy::new(config.context.max_messages, config.context.max_tokens)?
            .with_mode(config.context.strategy),
    );

    if config.auth.users.is_empty() {
        tracing::warn!("No users configured; every login will be rejected");
    }

    let state = Arc::new(AppState::new(
        config.clone(),
        persist_client,
        llm_client,
        context_strategy,
    ));

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!("API docs: http://{}/api/docs", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry.with(tracing_subscriber::fmt::layer().json()).init();
        }
        _ => {
            registry.with(tracing_subscriber::fmt::layer().pretty()).init();
        }
    }
}
