//! OpenAI-Compatible Provider
//!
//! Implementation of the `LlmProvider` trait for any endpoint speaking the
//! OpenAI chat-completions protocol. With the default base URL this talks
//! to the hosted OpenAI API; with a `base_url` override it talks to local
//! inference servers (Ollama, llama.cpp, vLLM) that expose the same
//! protocol.

use async_trait::async_trait;
use serde::Deserialize;

use crate::http_client::build_http_client;
use crate::provider::{
    missing_api_key_error, parse_http_error, LlmError, LlmProvider, LlmRequestOptions,
    LlmResponse, LlmResult, Message, MessageRole, ProviderConfig, UsageStats,
};

/// Default OpenAI API endpoint
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI-compatible chat-completions provider.
pub struct OpenAiCompatProvider {
    config: ProviderConfig,
    client: reqwest::Client,
    /// Whether requests must carry an API key. Local endpoints accept
    /// anonymous calls, so providers built with `local` skip the check.
    require_api_key: bool,
}

impl OpenAiCompatProvider {
    /// Create a provider for a hosted, authenticated endpoint.
    pub fn new(config: ProviderConfig) -> Self {
        let client = build_http_client(config.timeout_secs);
        Self {
            config,
            client,
            require_api_key: true,
        }
    }

    /// Create a provider for a local endpoint that accepts anonymous calls.
    pub fn local(config: ProviderConfig) -> Self {
        let client = build_http_client(config.timeout_secs);
        Self {
            config,
            client,
            require_api_key: false,
        }
    }

    /// Get the API base URL.
    fn base_url(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or(OPENAI_API_URL)
    }

    /// Build the request body for the API.
    fn build_request_body(
        &self,
        messages: &[Message],
        system: Option<&str>,
        request_options: &LlmRequestOptions,
    ) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": request_options
                .max_tokens_override
                .unwrap_or(self.config.max_tokens),
            "temperature": request_options
                .temperature_override
                .unwrap_or(self.config.temperature),
            "stream": false,
        });

        let mut api_messages: Vec<serde_json::Value> = Vec::new();
        if let Some(sys) = system {
            api_messages.push(serde_json::json!({
                "role": "system",
                "content": sys
            }));
        }
        for msg in messages {
            let role = match msg.role {
                MessageRole::System => "system",
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
            };
            api_messages.push(serde_json::json!({
                "role": role,
                "content": msg.content
            }));
        }
        body["messages"] = serde_json::json!(api_messages);

        body
    }

    /// Parse a chat-completions reply into an `LlmResponse`.
    fn parse_response(&self, response: &ChatCompletionsResponse) -> LlmResponse {
        let content = response
            .choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.clone());

        let usage = response
            .usage
            .as_ref()
            .map(|u| UsageStats {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        LlmResponse {
            content,
            usage,
            model: response.model.clone(),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &'static str {
        "openai-compat"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn send_message(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        if self.require_api_key && self.config.api_key.is_none() {
            return Err(missing_api_key_error(self.name()));
        }

        let body = self.build_request_body(&messages, system.as_deref(), &request_options);

        let mut request = self
            .client
            .post(self.base_url())
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(api_key) = &self.config.api_key {
            request = request.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body_text = response
            .text()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        if status != 200 {
            return Err(parse_http_error(status, &body_text, self.name()));
        }

        let parsed: ChatCompletionsResponse = serde_json::from_str(&body_text)
            .map_err(|e| LlmError::InvalidResponse(format!("failed to parse response: {}", e)))?;

        tracing::debug!(
            model = %parsed.model,
            input_tokens = parsed.usage.as_ref().map(|u| u.prompt_tokens).unwrap_or(0),
            output_tokens = parsed.usage.as_ref().map(|u| u.completion_tokens).unwrap_or(0),
            "chat completion settled"
        );

        Ok(self.parse_response(&parsed))
    }

    async fn health_check(&self) -> LlmResult<()> {
        // A one-token completion is the cheapest end-to-end probe that works
        // across every OpenAI-compatible server.
        let options = LlmRequestOptions {
            max_tokens_override: Some(1),
            ..Default::default()
        };
        self.send_message(vec![Message::user("ping")], None, options)
            .await
            .map(|_| ())
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}
