//! LLM-backed proposal generator.
//!
//! An `LlmProposer` renders a prompt from the snapshot, portfolio and risk
//! limits, sends it through a `ModelClient`, and pulls the `allocations`
//! object out of the reply. Every failure along the way (transport, HTTP
//! status, unparseable reply) is logged and becomes an empty allocation.

use reqwest::blocking::Client;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

use tplus_core::domain::Allocation;
use tplus_core::proposal::{ProposalGenerator, ProposalRequest};

use crate::config::{AgentSpec, ModelConfig};

/// Prompt used when an agent has no template file of its own.
pub const DEFAULT_PROMPT_TEMPLATE: &str = r#"You are {{ agent_name }}, a {{ agent_description }} managing a long-only basket of Shanghai A-shares.

Orders you choose today execute at the next session's open (T+1). Short selling is not allowed.

Trade date: {{ trade_date }}

Current portfolio:
{{ portfolio_state }}

Risk limits:
{{ risk_limits }}

Market data (five-minute bars with MACD, Bollinger, RSI and KDJ):
{{ market_payload }}

Reply with a JSON object inside a ```json fenced block, of the form
{"allocations": {"<symbol>": <weight>, ...}, "rationale": "<one paragraph>"}
Weights are fractions of portfolio value. Omit symbols you would not hold.
"#;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to build http client: {0}")]
    Client(String),

    #[error("model request failed: {0}")]
    Transport(String),

    #[error("model http error: status {0}")]
    Status(u16),

    #[error("malformed model response: {0}")]
    Response(String),
}

// ─── Prompt rendering ───────────────────────────────────────────────

/// Template with `{{ key }}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptBuilder {
    template: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_PROMPT_TEMPLATE)
    }
}

impl PromptBuilder {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        Ok(Self::new(std::fs::read_to_string(path)?))
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Substitute every `{{ key }}`; unknown placeholders are left as is.
    pub fn render(&self, context: &[(&str, &str)]) -> String {
        context
            .iter()
            .fold(self.template.clone(), |rendered, (key, value)| {
                rendered.replace(&format!("{{{{ {key} }}}}"), value)
            })
    }
}

/// First `max_chars` characters of `text`, never splitting a character.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ─── Reply parsing ──────────────────────────────────────────────────

/// The JSON object in a model reply.
///
/// Prefers the first ```json fenced block holding a `{...}` object, taking
/// the shortest object that closes right before the fence. Otherwise takes
/// everything from the first `{` to the last `}`.
pub fn extract_json_block(text: &str) -> Option<&str> {
    const FENCE: &str = "```json";
    let mut search_from = 0;
    while let Some(found) = text[search_from..].find(FENCE) {
        let body_start = search_from + found + FENCE.len();
        let body = text[body_start..].trim_start();
        if body.starts_with('{') {
            let offset = text.len() - body.len();
            for (i, _) in body.match_indices('}') {
                if body[i + 1..].trim_start().starts_with("```") {
                    return Some(&text[offset..offset + i + 1]);
                }
            }
        }
        search_from = body_start;
    }

    let open = text.find('{')?;
    let close = text.rfind('}')?;
    (close > open).then(|| &text[open..=close])
}

/// Symbol weights from the reply's `allocations` object.
///
/// Numbers and numeric strings are kept; any other value is dropped. A
/// reply without a parseable object yields an empty allocation.
pub fn extract_allocations(text: &str) -> Allocation {
    let Some(block) = extract_json_block(text) else {
        return Allocation::new();
    };
    let Ok(payload) = serde_json::from_str::<serde_json::Value>(block) else {
        return Allocation::new();
    };
    let Some(allocations) = payload.get("allocations").and_then(|a| a.as_object()) else {
        return Allocation::new();
    };

    allocations
        .iter()
        .filter_map(|(symbol, value)| {
            let weight = match value {
                serde_json::Value::Number(n) => n.as_f64(),
                serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            match weight {
                Some(w) => Some((symbol.clone(), w)),
                None => {
                    debug!(%symbol, %value, "dropping non-numeric allocation");
                    None
                }
            }
        })
        .collect()
}

// ─── Model clients ──────────────────────────────────────────────────

/// Anything that turns a prompt into a text reply.
pub trait ModelClient: Send + Sync {
    fn complete(&self, agent: &AgentSpec, prompt: &str) -> Result<String, ModelError>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f64,
    messages: Vec<ChatMessage<'a>>,
}

/// OpenAI-compatible chat-completions client with bounded retries.
///
/// Server errors and transport failures are retried up to `retries` times;
/// any other status fails immediately.
pub struct HttpModelClient {
    endpoint: String,
    model: String,
    temperature: f64,
    retries: u32,
    api_key: Option<String>,
    client: Client,
}

impl HttpModelClient {
    pub fn new(config: &ModelConfig) -> Result<Self, ModelError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            warn!(var = %config.api_key_env, "model API key not set; sending unauthenticated requests");
        }
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|err| ModelError::Client(err.to_string()))?;
        Ok(Self {
            endpoint: format!("{}/chat/completions", config.endpoint.trim_end_matches('/')),
            model: config.model.clone(),
            temperature: config.temperature,
            retries: config.retries,
            api_key,
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn parse_reply(body: &serde_json::Value) -> Result<String, ModelError> {
        body.pointer("/choices/0/message/content")
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| ModelError::Response("missing choices[0].message.content".into()))
    }
}

impl ModelClient for HttpModelClient {
    fn complete(&self, agent: &AgentSpec, prompt: &str) -> Result<String, ModelError> {
        let request = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &agent.description,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let start = Instant::now();
        let mut attempts = 0u32;
        let mut last_error = ModelError::Transport("no attempt made".into());
        while attempts <= self.retries {
            attempts += 1;
            let mut builder = self.client.post(&self.endpoint).json(&request);
            if let Some(key) = &self.api_key {
                builder = builder.bearer_auth(key);
            }
            match builder.send() {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let body: serde_json::Value = resp
                            .json()
                            .map_err(|err| ModelError::Response(err.to_string()))?;
                        debug!(
                            agent = %agent.name,
                            attempts,
                            duration_ms = start.elapsed().as_millis() as u64,
                            "model replied"
                        );
                        return Self::parse_reply(&body);
                    }
                    last_error = ModelError::Status(status.as_u16());
                    if !status.is_server_error() {
                        break;
                    }
                }
                Err(err) => {
                    last_error = ModelError::Transport(err.to_string());
                }
            }
            debug!(agent = %agent.name, attempts, error = %last_error, "model call failed");
        }
        Err(last_error)
    }
}

// ─── Proposer ───────────────────────────────────────────────────────

/// One LLM agent as a proposal generator.
pub struct LlmProposer {
    spec: AgentSpec,
    prompt: PromptBuilder,
    client: Arc<dyn ModelClient>,
    max_payload_chars: usize,
}

impl LlmProposer {
    pub fn new(
        spec: AgentSpec,
        prompt: PromptBuilder,
        client: Arc<dyn ModelClient>,
        max_payload_chars: usize,
    ) -> Self {
        Self {
            spec,
            prompt,
            client,
            max_payload_chars,
        }
    }

    pub fn spec(&self) -> &AgentSpec {
        &self.spec
    }

    /// The prompt this agent would send for `request`.
    pub fn render_prompt(&self, request: &ProposalRequest<'_>) -> Result<String, serde_json::Error> {
        let trade_date = request.date.to_string();
        let portfolio = serde_json::to_string_pretty(request.portfolio)?;
        let limits = serde_json::to_string_pretty(request.risk_limits)?;
        let market = serde_json::to_string(request.snapshot)?;
        let market = truncate_chars(&market, self.max_payload_chars);

        Ok(self.prompt.render(&[
            ("agent_name", self.spec.name.as_str()),
            ("agent_description", self.spec.description.as_str()),
            ("trade_date", trade_date.as_str()),
            ("portfolio_state", portfolio.as_str()),
            ("risk_limits", limits.as_str()),
            ("market_payload", market),
        ]))
    }
}

impl ProposalGenerator for LlmProposer {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn propose(&self, request: &ProposalRequest<'_>) -> Allocation {
        let prompt = match self.render_prompt(request) {
            Ok(prompt) => prompt,
            Err(err) => {
                warn!(agent = %self.spec.name, error = %err, "failed to render prompt");
                return Allocation::new();
            }
        };
        match self.client.complete(&self.spec, &prompt) {
            Ok(reply) => {
                let allocations = extract_allocations(&reply);
                if allocations.is_empty() {
                    warn!(agent = %self.spec.name, date = %request.date, "reply held no allocations");
                }
                allocations
            }
            Err(err) => {
                warn!(agent = %self.spec.name, date = %request.date, error = %err, "model call failed");
                Allocation::new()
            }
        }
    }
}
