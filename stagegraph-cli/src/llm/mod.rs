//! Model client abstraction for pipeline stages.
//!
//! Stages build a prompt whose first line is `## task: <name>` and ask [`StructuredLlm`] for
//! a typed reply. `StructuredLlm` owns the retry policy: a failed call, an unparsable reply or
//! a reply that breaks the caller's conversion is retried with exponential backoff.
//! Implementations: `ChatOpenAI` (OpenAI-compatible API, feature `openai`), `MockLlm`
//! (scripted replies).

#[cfg(feature = "openai")]
mod openai;
pub(crate) mod mock;

pub use mock::MockLlm;
#[cfg(feature = "openai")]
pub use openai::ChatOpenAI;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Prompt header line that names the task; `MockLlm` scripts replies by it.
pub const TASK_HEADER: &str = "## task: ";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("model API error: {0}")]
    Api(String),

    #[error("model returned empty content")]
    EmptyResponse,

    #[error("reply is not valid JSON for {task}: {message}")]
    InvalidReply { task: String, message: String },

    #[error("no scripted reply for task '{0}'")]
    Unscripted(String),

    #[error("{task} failed after {attempts} attempt(s): {last}")]
    Exhausted {
        task: String,
        attempts: u32,
        last: String,
    },
}

/// One prompt in, raw reply text out.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Attempts and backoff for structured generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// No waiting between attempts (tests, local mocks).
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Delay before retrying after failed attempt `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_backoff)
    }
}

/// Builds a prompt: task header, instructions, then one `label: value` line per context item.
pub fn prompt(task: &str, instructions: &str, context: &[(&str, String)]) -> String {
    let mut out = format!("{TASK_HEADER}{task}\n{}\n", instructions.trim());
    for (label, value) in context {
        out.push_str(&format!("\n{label}: {value}"));
    }
    out.push_str("\n\nReply with a single JSON object only.");
    out
}

/// Task name from a prompt built by [`prompt`].
pub fn task_of(prompt: &str) -> Option<&str> {
    prompt
        .lines()
        .next()
        .and_then(|line| line.strip_prefix(TASK_HEADER))
        .map(str::trim)
}

/// Strips a Markdown code fence around a JSON reply, if present.
fn json_body(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// LLM client plus retry policy; hands out typed replies.
#[derive(Clone)]
pub struct StructuredLlm {
    client: Arc<dyn LlmClient>,
    policy: RetryPolicy,
}

impl StructuredLlm {
    pub fn new(client: Arc<dyn LlmClient>, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Generates and deserializes a `T` for `task`.
    pub async fn generate<T: DeserializeOwned>(
        &self,
        task: &str,
        prompt: &str,
    ) -> Result<T, LlmError> {
        self.generate_with(task, prompt, Ok::<T, String>).await
    }

    /// Generates a `T`, then converts it with `convert`; a conversion error is retried like a
    /// parse error.
    pub async fn generate_with<T, U, F>(
        &self,
        task: &str,
        prompt: &str,
        convert: F,
    ) -> Result<U, LlmError>
    where
        T: DeserializeOwned,
        F: Fn(T) -> Result<U, String>,
    {
        let attempts = self.policy.max_attempts.max(1);
        let mut last = String::new();
        for attempt in 0..attempts {
            tracing::debug!(task, attempt = attempt + 1, "Generating structured output");
            let result = match self.client.complete(prompt).await {
                Ok(reply) => serde_json::from_str::<T>(json_body(&reply))
                    .map_err(|e| {
                        LlmError::InvalidReply {
                            task: task.to_string(),
                            message: e.to_string(),
                        }
                        .to_string()
                    })
                    .and_then(&convert),
                Err(e) => Err(e.to_string()),
            };
            match result {
                Ok(value) => return Ok(value),
                Err(e) => {
                    last = e;
                    if attempt + 1 < attempts {
                        let backoff = self.policy.backoff(attempt);
                        tracing::warn!(
                            task,
                            attempt = attempt + 1,
                            max_attempts = attempts,
                            backoff_ms = backoff.as_millis() as u64,
                            error = %last,
                            "Retrying model request"
                        );
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }
        tracing::error!(task, attempts, error = %last, "Model request attempts exhausted");
        Err(LlmError::Exhausted {
            task: task.to_string(),
            attempts,
            last,
        })
    }
}
