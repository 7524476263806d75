/// LLM Client — the single point of entry for all Claude API calls.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
/// All LLM interactions MUST go through this module.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all LLM calls.
/// Intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "claude-haiku-4-5-20251001";
const MAX_TOKENS: u32 = 2000;
/// Total attempts on an overloaded upstream (1 initial + 2 retries).
const MAX_ATTEMPTS: u32 = 3;
/// Anthropic's "overloaded_error" status. The only condition worth
/// retrying — every other failure falls through to the next cascade tier.
const OVERLOADED_STATUS: u16 = 529;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Overloaded after {attempts} attempts")]
    Overloaded { attempts: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct LlmResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl LlmResponse {
    fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// The text-completion capability the generation cascade depends on.
/// `LlmClient` is the production implementation; tests inject mocks.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError>;
}

/// The single LLM client used by all services.
/// Wraps the Anthropic Messages API with overload-aware retry.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()?,
            api_key,
        })
    }

    /// Makes a call to the Claude API and returns the text content.
    ///
    /// Retries ONLY on 529 (overloaded), with linear backoff of
    /// `attempt * 2s` between attempts. Any other failure is returned
    /// immediately — the caller's fallback tiers handle it.
    async fn call(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        for attempt in 1..=MAX_ATTEMPTS {
            if attempt > 1 {
                let delay = std::time::Duration::from_secs(2 * (attempt as u64 - 1));
                warn!(
                    "LLM overloaded (attempt {}/{}), retrying after {}s...",
                    attempt - 1,
                    MAX_ATTEMPTS,
                    delay.as_secs()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await?;

            let status = response.status();

            if status.as_u16() == OVERLOADED_STATUS {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API overloaded: {body}");
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<AnthropicError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let llm_response: LlmResponse = response.json().await?;

            debug!(
                "LLM call succeeded: input_tokens={}, output_tokens={}",
                llm_response.usage.input_tokens, llm_response.usage.output_tokens
            );

            return llm_response
                .text()
                .map(str::to_string)
                .ok_or(LlmError::EmptyContent);
        }

        Err(LlmError::Overloaded {
            attempts: MAX_ATTEMPTS,
        })
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        self.call(system, prompt).await
    }
}
