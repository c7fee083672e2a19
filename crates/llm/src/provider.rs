//! LLM Provider Trait
//!
//! Defines the common interface for LLM providers together with the
//! request/response types the reviewer agents exchange with them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by LLM providers.
#[derive(Error, Debug)]
pub enum LlmError {
    /// The API key is missing or rejected
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// The provider throttled the request
    #[error("Rate limited: {message}")]
    RateLimited { message: String },

    /// The requested model does not exist at this endpoint
    #[error("Model not found: {message}")]
    ModelNotFound { message: String },

    /// Any other non-success HTTP reply
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Could not reach the endpoint at all
    #[error("Network error: {0}")]
    Network(String),

    /// The reply did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type alias for provider calls
pub type LlmResult<T> = Result<T, LlmError>;

/// Static configuration for one provider instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Model identifier sent with every request
    pub model: String,
    /// API key; `None` for local endpoints that accept anonymous calls
    pub api_key: Option<String>,
    /// Endpoint override; `None` uses the provider default
    pub base_url: Option<String>,
    /// Completion token ceiling per request
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl ProviderConfig {
    /// Config with sensible defaults for a model.
    pub fn for_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: None,
            base_url: None,
            max_tokens: 4096,
            temperature: 0.2,
            timeout_secs: 120,
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Point the provider at a different endpoint (e.g. a local server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Role of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// One conversation message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// Per-request overrides on top of the provider config.
#[derive(Debug, Clone, Default)]
pub struct LlmRequestOptions {
    /// Override the configured temperature (reviewer agents pin 0.0)
    pub temperature_override: Option<f32>,
    /// Override the configured completion ceiling
    pub max_tokens_override: Option<u32>,
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UsageStats {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Complete (non-streaming) response from a provider.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Assistant text, `None` when the model returned nothing usable
    pub content: Option<String>,
    /// Token accounting for the exchange
    pub usage: UsageStats,
    /// Model that actually served the request
    pub model: String,
}

/// Trait that all LLM providers must implement.
///
/// Provides a unified interface for single-shot completions and health
/// checking. Streaming is not part of this workspace's surface; reviewer
/// agents only need the settled text.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Returns the provider name for identification.
    fn name(&self) -> &'static str;

    /// Returns the current model being used.
    fn model(&self) -> &str;

    /// Get the configuration for this provider.
    fn config(&self) -> &ProviderConfig;

    /// Send a conversation and get a complete response.
    async fn send_message(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse>;

    /// Check if the provider is healthy and reachable.
    async fn health_check(&self) -> LlmResult<()>;
}

/// Helper function to create an error for a missing API key.
pub fn missing_api_key_error(provider: &str) -> LlmError {
    LlmError::AuthenticationFailed {
        message: format!("API key not configured for {}", provider),
    }
}

/// Helper function to map HTTP error status codes onto `LlmError`.
pub fn parse_http_error(status: u16, body: &str, provider: &str) -> LlmError {
    match status {
        401 | 403 => LlmError::AuthenticationFailed {
            message: format!("{}: request rejected ({})", provider, status),
        },
        404 => LlmError::ModelNotFound {
            message: format!("{}: {}", provider, truncate(body, 200)),
        },
        429 => LlmError::RateLimited {
            message: format!("{}: {}", provider, truncate(body, 200)),
        },
        _ => LlmError::Http {
            status,
            message: truncate(body, 200).to_string(),
        },
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
