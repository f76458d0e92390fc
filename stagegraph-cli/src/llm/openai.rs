//! OpenAI Chat Completions client implementing `LlmClient`.
//!
//! Sends each prompt as a single user message, with a fixed system message asking for JSON.
//! Works with any OpenAI-compatible endpoint via `with_config`.

use async_trait::async_trait;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs,
    },
    Client,
};

use super::{LlmClient, LlmError};

const SYSTEM_PROMPT: &str =
    "You produce structured product content. Answer with one JSON object and nothing else.";

/// OpenAI Chat Completions client.
///
/// Uses `OPENAI_API_KEY` from the environment with `new`, or an explicit config with
/// `with_config`. Temperature defaults to 0.
pub struct ChatOpenAI {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl ChatOpenAI {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            model: model.into(),
            temperature: 0.0,
        }
    }

    /// Custom API key or base URL.
    pub fn with_config(config: OpenAIConfig, model: impl Into<String>) -> Self {
        Self {
            client: Client::with_config(config),
            model: model.into(),
            temperature: 0.0,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmClient for ChatOpenAI {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let messages = vec![
            ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage::from(
                SYSTEM_PROMPT,
            )),
            ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage::from(prompt)),
        ];
        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.clone())
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| LlmError::Api(format!("request build failed: {}", e)))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| LlmError::Api(e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(content)
    }
}
