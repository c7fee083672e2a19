//! LLM Review Agent
//!
//! Sends the combined patch to an LLM provider with a deterministic
//! review prompt (temperature 0, review date taken from the injected
//! context clock) and parses a strict JSON findings payload out of the
//! reply. When the reply is truncated or wrapped in prose, individual
//! finding objects are salvaged and reported as partial output.
//!
//! The same implementation backs two registered agents: the paid
//! `llm-review` pointed at a hosted endpoint, and the free `local-review`
//! pointed at a local OpenAI-compatible server.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;

use review_cascade_core::{
    AgentContext, AgentMetrics, AgentResult, FailureStage, Finding, ReviewAgent, Severity,
    FREE_LOCAL_AGENT_ID,
};
use review_cascade_llm::{LlmProvider, LlmRequestOptions, Message};

/// Patch text beyond this many characters is truncated before prompting.
const MAX_PATCH_CHARS: usize = 60_000;

/// Hosted endpoint pricing used for the budget gate's cost accounting.
const PROMPT_USD_PER_1K: f64 = 0.000_15;
const COMPLETION_USD_PER_1K: f64 = 0.000_6;

/// Findings payload the model is instructed to emit.
#[derive(Debug, Deserialize)]
struct ReviewPayload {
    findings: Vec<WireFinding>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFinding {
    file: String,
    #[serde(default)]
    line: Option<u32>,
    #[serde(default)]
    end_line: Option<u32>,
    severity: Severity,
    message: String,
    #[serde(default)]
    rule_id: Option<String>,
    #[serde(default)]
    suggestion: Option<String>,
}

/// LLM-backed reviewer agent.
pub struct LlmReviewAgent {
    id: &'static str,
    display_name: &'static str,
    paid: bool,
    provider: Option<Arc<dyn LlmProvider>>,
}

impl LlmReviewAgent {
    /// The paid reviewer against a hosted endpoint.
    pub fn paid(provider: Option<Arc<dyn LlmProvider>>) -> Self {
        Self {
            id: "llm-review",
            display_name: "LLM Review",
            paid: true,
            provider,
        }
    }

    /// The designated free reviewer against a local endpoint. It still
    /// reports inference usage; the budget gate exempts it by id.
    pub fn local(provider: Option<Arc<dyn LlmProvider>>) -> Self {
        Self {
            id: FREE_LOCAL_AGENT_ID,
            display_name: "Local Review",
            paid: true,
            provider,
        }
    }

    /// Build the deterministic review prompt for a context.
    fn build_prompt(&self, ctx: &AgentContext) -> String {
        let mut patch = ctx.combined_patch();
        if patch.len() > MAX_PATCH_CHARS {
            let cut = patch
                .char_indices()
                .nth(MAX_PATCH_CHARS)
                .map(|(i, _)| i)
                .unwrap_or(patch.len());
            patch.truncate(cut);
            patch.push_str("\n... (patch truncated)");
        }

        format!(
            r#"Review the following change for defects, risky patterns, and maintainability problems.
Review date: {date}

Report only real issues in the changed lines. For each issue use severity "error", "warning", or "info".
Respond with exactly this JSON shape and nothing else:
{{
  "findings": [
    {{"file": "src/lib.rs", "line": 42, "severity": "warning", "message": "describe the issue", "ruleId": "short-slug", "suggestion": "optional replacement code"}}
  ]
}}

Change to review:
```
{patch}
```"#,
            date = ctx.now.format("%Y-%m-%d"),
        )
    }

    fn system_prompt(&self) -> String {
        "You are an expert code reviewer producing machine-readable findings.".to_string()
    }

    fn wire_to_finding(&self, wire: WireFinding) -> Finding {
        let mut finding = Finding::new(wire.severity, wire.file, wire.message, self.id);
        finding.line = wire.line;
        finding.end_line = wire.end_line;
        finding.rule_id = wire.rule_id;
        finding.suggestion = wire.suggestion;
        finding
    }

    /// Extract the findings payload from the model reply: direct JSON
    /// parse first, then the outermost brace block for replies wrapped in
    /// prose or code fences.
    fn extract_payload(&self, reply: &str) -> Option<ReviewPayload> {
        if let Ok(payload) = serde_json::from_str::<ReviewPayload>(reply) {
            return Some(payload);
        }
        let start = reply.find('{')?;
        let end = reply.rfind('}')?;
        if end <= start {
            return None;
        }
        serde_json::from_str::<ReviewPayload>(&reply[start..=end]).ok()
    }

    /// Pull individually-parseable finding objects out of a reply that
    /// failed whole-payload parsing (usually a truncated completion).
    fn salvage_findings(&self, reply: &str) -> Vec<Finding> {
        let object = Regex::new(r#"\{[^{}]*"file"\s*:\s*"[^"]+"[^{}]*\}"#).unwrap();
        object
            .find_iter(reply)
            .filter_map(|m| serde_json::from_str::<WireFinding>(m.as_str()).ok())
            .map(|w| self.wire_to_finding(w))
            .collect()
    }

    fn cost_usd(&self, input_tokens: u32, output_tokens: u32) -> f64 {
        if self.id == FREE_LOCAL_AGENT_ID {
            return 0.0;
        }
        f64::from(input_tokens) / 1000.0 * PROMPT_USD_PER_1K
            + f64::from(output_tokens) / 1000.0 * COMPLETION_USD_PER_1K
    }
}

#[async_trait]
impl ReviewAgent for LlmReviewAgent {
    fn id(&self) -> &str {
        self.id
    }

    fn name(&self) -> &str {
        self.display_name
    }

    fn uses_paid_inference(&self) -> bool {
        self.paid
    }

    async fn run(&self, ctx: &AgentContext) -> AgentResult {
        let start = Instant::now();

        let Some(provider) = &self.provider else {
            return AgentResult::failure(
                self.id,
                format!("No LLM provider configured for '{}'", self.id),
                FailureStage::Preflight,
            );
        };

        let prompt = self.build_prompt(ctx);
        let options = LlmRequestOptions {
            temperature_override: Some(0.0),
            ..Default::default()
        };

        let response = match provider
            .send_message(vec![Message::user(prompt)], Some(self.system_prompt()), options)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return AgentResult::failure(self.id, e.to_string(), FailureStage::Execution);
            }
        };

        let metrics = AgentMetrics {
            duration_ms: start.elapsed().as_millis() as u64,
            input_tokens: response.usage.input_tokens,
            output_tokens: response.usage.output_tokens,
            cost_usd: self.cost_usd(response.usage.input_tokens, response.usage.output_tokens),
        };

        let Some(content) = response.content else {
            return AgentResult::failure_with_partials(
                self.id,
                "Model returned no content",
                FailureStage::Postprocess,
                Vec::new(),
                metrics,
            );
        };

        match self.extract_payload(&content) {
            Some(payload) => {
                let findings = payload
                    .findings
                    .into_iter()
                    .map(|w| self.wire_to_finding(w))
                    .collect();
                AgentResult::success(self.id, findings, metrics)
            }
            None => {
                let partial_findings = self.salvage_findings(&content);
                AgentResult::failure_with_partials(
                    self.id,
                    "Could not parse review payload from model reply",
                    FailureStage::Postprocess,
                    partial_findings,
                    metrics,
                )
            }
        }
    }
}
