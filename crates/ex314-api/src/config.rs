use std::path::{Path, PathBuf};

use config::{Config as ConfigLoader, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use ex314_context::{WindowMode, DEFAULT_MAX_MESSAGES, DEFAULT_MAX_TOKENS};
use ex314_llm::ProviderConfig;
use ex314_persist::StorageEnvironment;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub llm_api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Deadline for producing response headers; streamed bodies are not cut off
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// `openai_compatible` or `relay`
    pub provider: String,
    pub model: String,
    /// OpenAI-compatible base URL; Together AI when unset
    #[serde(default)]
    pub base_url: Option<String>,
    /// Relay endpoint URL
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Completion limit sent upstream
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContextConfig {
    #[serde(default)]
    pub strategy: WindowMode,
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
    /// Token budget for history sent upstream (NOT the completion limit)
    #[serde(default = "default_context_tokens")]
    pub max_tokens: usize,
}

fn default_max_messages() -> usize {
    DEFAULT_MAX_MESSAGES
}

fn default_context_tokens() -> usize {
    DEFAULT_MAX_TOKENS
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            strategy: WindowMode::default(),
            max_messages: DEFAULT_MAX_MESSAGES,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// `durable` or `ephemeral`
    pub mode: String,
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            mode: "durable".to_string(),
            path: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
    #[serde(default)]
    pub users: Vec<UserEntry>,
}

fn default_session_ttl() -> u64 {
    60 * 60 * 24
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: default_session_ttl(),
            users: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserEntry {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub admin: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables (SERVER_, LLM_, STORAGE_, CONTEXT_ prefixes, LOG_LEVEL, LOG_FORMAT)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let mut builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false));

        for prefix in ["SERVER", "LLM", "STORAGE", "CONTEXT"] {
            builder = builder.add_source(
                Environment::with_prefix(prefix)
                    .keep_prefix(true)
                    .separator("_")
                    .try_parsing(true),
            );
        }

        let builder = builder
            .set_override_option("logging.level", std::env::var("LOG_LEVEL").ok())?
            .set_override_option("logging.format", std::env::var("LOG_FORMAT").ok())?;

        let mut cfg: Config = builder.build()?.try_deserialize()?;

        // Secrets from ENV (not in TOML)
        cfg.llm_api_key = std::env::var("LLM_API_KEY")
            .or_else(|_| std::env::var("TOGETHER_API_KEY"))
            .unwrap_or_default();
        if cfg.llm.provider == "openai_compatible" && cfg.llm_api_key.is_empty() {
            return Err(ConfigError::Message(
                "LLM_API_KEY environment variable is required".to_string(),
            ));
        }

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        ConfigLoader::builder()
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()
    }

    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        ConfigLoader::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    pub fn provider_config(&self) -> Result<ProviderConfig, ConfigError> {
        let config = match self.llm.provider.as_str() {
            "openai_compatible" => match &self.llm.base_url {
                Some(base_url) => ProviderConfig::openai_compatible(&self.llm_api_key, base_url),
                None => ProviderConfig::together(&self.llm_api_key),
            },
            "relay" => {
                let url = self.llm.url.clone().ok_or_else(|| {
                    ConfigError::Message("llm.url is required for the relay provider".to_string())
                })?;
                let key = Some(self.llm_api_key.clone()).filter(|k| !k.is_empty());
                ProviderConfig::relay(url, key)
            }
            other => {
                return Err(ConfigError::Message(format!("unknown llm.provider: {}", other)));
            }
        };

        Ok(match self.llm.timeout_secs {
            Some(secs) => config.with_timeout(secs),
            None => config,
        })
    }

    pub fn storage_environment(&self) -> Result<StorageEnvironment, ConfigError> {
        match self.storage.mode.as_str() {
            "durable" => Ok(StorageEnvironment::Durable {
                path: self.storage.path.clone(),
            }),
            "ephemeral" => Ok(StorageEnvironment::Ephemeral),
            other => Err(ConfigError::Message(format!("unknown storage.mode: {}", other))),
        }
    }
}
