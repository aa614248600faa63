//! OpenAI-compatible chat-completions client.
//!
//! [`ChatClient`] keeps no mutable per-call state, so one instance can serve
//! the whole shared worker pool concurrently.

use crate::backend::{Evaluation, SharedClient, UsageSummary};
use crate::config::ClientConfig;
use crate::error::BackendError;
use crate::model::BackendKind;
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;

/// Resolve API credentials from the environment.
///
/// `OPENROUTER_API_KEY` wins over `OPENAI_API_KEY` and selects the
/// OpenRouter base URL; with only an OpenAI key, calls go to OpenAI
/// directly.
pub fn credentials_from_env() -> Result<(String, String), BackendError> {
    if let Ok(key) = std::env::var("OPENROUTER_API_KEY") {
        if !key.is_empty() {
            return Ok((key, BackendKind::OpenRouter.base_url().to_string()));
        }
    }
    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        if !key.is_empty() {
            return Ok((key, BackendKind::OpenAi.base_url().to_string()));
        }
    }
    Err(BackendError::MissingApiKey)
}

/// Chat-completions client against an OpenAI-compatible API.
pub struct ChatClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    config: ClientConfig,
}

impl fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("config", &self.config)
            .finish()
    }
}

impl ChatClient {
    /// Create a client for the given key and base URL.
    pub fn new(
        api_key: String,
        base_url: String,
        config: ClientConfig,
    ) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            api_key,
            base_url,
            config,
        })
    }

    /// Create a client with credentials resolved from the environment.
    pub fn from_env(config: ClientConfig) -> Result<Self, BackendError> {
        let (api_key, base_url) = credentials_from_env()?;
        Self::new(api_key, base_url, config)
    }

    /// Build the question-answering prompt for a direct call.
    pub(crate) fn qa_prompt(question: &str, context: &str) -> String {
        format!(
            "Context:\n{}\n\nQuestion: {}\n\nAnswer the question based on the context. Be concise.",
            context, question
        )
    }

    /// Issue one chat completion and return the answer text plus token
    /// counts `(input, output)` when the API reported them.
    pub(crate) async fn chat(
        &self,
        model_id: &str,
        prompt: &str,
    ) -> Result<(String, Option<(u64, u64)>), BackendError> {
        log::debug!(
            "chat completion via {} ({} prompt chars)",
            model_id,
            prompt.len()
        );
        let body = serde_json::json!({
            "model": model_id,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message: String = body.chars().take(200).collect();
            return Err(BackendError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        let answer = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(BackendError::NoContent)?;

        let tokens = parsed.usage.map(|u| {
            (
                u.prompt_tokens.unwrap_or(0),
                u.completion_tokens.unwrap_or(0),
            )
        });

        Ok((answer, tokens))
    }
}

#[async_trait]
impl SharedClient for ChatClient {
    async fn evaluate(
        &self,
        model_id: &str,
        question: &str,
        context: &str,
    ) -> Result<Evaluation, BackendError> {
        let prompt = Self::qa_prompt(question, context);
        let (answer, tokens) = self.chat(model_id, &prompt).await?;

        let usage = tokens.map(|(input, output)| {
            let mut summary = UsageSummary::default();
            summary.record(model_id, input, output);
            summary
        });

        Ok(Evaluation {
            answer,
            sub_calls: 1,
            usage,
        })
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
}
