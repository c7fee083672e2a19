//! Review Cascade LLM
//!
//! Provider abstraction used by the LLM reviewer agents. One trait,
//! `LlmProvider`, and one concrete implementation speaking the
//! OpenAI-compatible chat-completions protocol — which covers both hosted
//! paid endpoints and local inference servers via `base_url`.

pub mod http_client;
pub mod openai;
pub mod provider;

pub use openai::OpenAiCompatProvider;
pub use provider::{
    LlmError, LlmProvider, LlmRequestOptions, LlmResponse, LlmResult, Message, MessageRole,
    ProviderConfig, UsageStats,
};
