//! Agent Registry
//!
//! The run's agent allowlist. Pass configurations refer to agents by id;
//! ids that do not resolve here are rejected outright by the orchestrator
//! and never receive the execution context, environment, or secrets.

use std::collections::HashMap;
use std::sync::Arc;

use review_cascade_core::ReviewAgent;
use review_cascade_llm::{LlmProvider, OpenAiCompatProvider, ProviderConfig};

use crate::models::config::ReviewConfig;
use crate::services::agents::{CommandLintAgent, LlmReviewAgent, PatternScanAgent};

/// Allowlist of runnable agents, keyed by stable id.
pub struct AgentRegistry {
    agents: HashMap<String, Arc<dyn ReviewAgent>>,
}

impl AgentRegistry {
    /// An empty registry. Useful for tests that register stubs.
    pub fn new() -> Self {
        Self {
            agents: HashMap::new(),
        }
    }

    /// Registry with every built-in agent, wired from the configuration.
    ///
    /// The paid reviewer only gets a provider when an API key is present;
    /// without one it still registers and fails preflight if scheduled, so
    /// the skip reason lands in the summary instead of silently vanishing.
    pub fn builtin(config: &ReviewConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PatternScanAgent::new()));
        registry.register(Arc::new(CommandLintAgent::new(config.lint.clone())));

        let paid_provider: Option<Arc<dyn LlmProvider>> =
            std::env::var(&config.llm.api_key_env).ok().map(|api_key| {
                let mut provider_config =
                    ProviderConfig::for_model(&config.llm.model).with_api_key(api_key);
                provider_config.base_url = config.llm.base_url.clone();
                Arc::new(OpenAiCompatProvider::new(provider_config)) as Arc<dyn LlmProvider>
            });
        registry.register(Arc::new(LlmReviewAgent::paid(paid_provider)));

        let local_provider: Arc<dyn LlmProvider> = Arc::new(OpenAiCompatProvider::local(
            ProviderConfig::for_model(&config.llm.local_model)
                .with_base_url(&config.llm.local_base_url),
        ));
        registry.register(Arc::new(LlmReviewAgent::local(Some(local_provider))));

        registry
    }

    /// Add an agent. A later registration under the same id replaces the
    /// earlier one.
    pub fn register(&mut self, agent: Arc<dyn ReviewAgent>) {
        self.agents.insert(agent.id().to_string(), agent);
    }

    /// Resolve an agent id against the allowlist.
    pub fn get(&self, id: &str) -> Option<Arc<dyn ReviewAgent>> {
        self.agents.get(id).cloned()
    }

    /// Whether an id is allowlisted.
    pub fn contains(&self, id: &str) -> bool {
        self.agents.contains_key(id)
    }

    /// Allowlisted ids, sorted for stable output.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.agents.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
