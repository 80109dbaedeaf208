// Configuration layer for provider-agnostic LLM client creation

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::openai::TOGETHER_API_BASE;
use crate::traits::ChatClient;

/// Type of LLM provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    #[default]
    #[serde(rename = "openai_compatible")]
    OpenAICompatible,
    Relay,
}

/// Configuration for an OpenAI-compatible chat completions endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAICompatibleConfig {
    pub api_key: String,
    /// Defaults to the Together AI endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl OpenAICompatibleConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Configuration for a relay endpoint taking `{ message, context }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Provider-specific configuration details
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderDetails {
    #[serde(rename = "openai_compatible")]
    OpenAICompatible(OpenAICompatibleConfig),
    Relay(RelayConfig),
}

/// Complete provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(flatten)]
    pub details: ProviderDetails,
    /// Whole-request timeout in seconds; streaming replies included
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl ProviderConfig {
    pub fn together(api_key: impl Into<String>) -> Self {
        Self {
            details: ProviderDetails::OpenAICompatible(OpenAICompatibleConfig::new(api_key)),
            timeout_secs: None,
        }
    }

    pub fn openai_compatible(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            details: ProviderDetails::OpenAICompatible(
                OpenAICompatibleConfig::new(api_key).with_base_url(base_url),
            ),
            timeout_secs: None,
        }
    }

    pub fn relay(url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            details: ProviderDetails::Relay(RelayConfig {
                url: url.into(),
                api_key,
            }),
            timeout_secs: None,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn provider_type(&self) -> ProviderType {
        match self.details {
            ProviderDetails::OpenAICompatible(_) => ProviderType::OpenAICompatible,
            ProviderDetails::Relay(_) => ProviderType::Relay,
        }
    }
}

/// Factory for creating LLM clients from configuration
pub struct ClientFactory;

impl ClientFactory {
    pub fn create_chat_client(config: ProviderConfig) -> Result<Arc<dyn ChatClient>> {
        let timeout = config.timeout_secs.map(Duration::from_secs);
        match config.details {
            ProviderDetails::OpenAICompatible(cfg) => {
                let base_url = cfg.base_url.unwrap_or_else(|| TOGETHER_API_BASE.to_string());
                let client =
                    crate::openai::OpenAICompatibleClient::with_base_url(cfg.api_key, base_url, timeout)?;
                Ok(Arc::new(client))
            }
            ProviderDetails::Relay(cfg) => {
                let client = crate::relay::RelayClient::new(cfg.url, cfg.api_key, timeout)?;
                Ok(Arc::new(client))
            }
        }
    }
}
