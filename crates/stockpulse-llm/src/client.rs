//! HTTP client for OpenRouter-style chat completions.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::backend::CompletionBackend;
use crate::error::LlmError;
use crate::models::ModelDescriptor;

const DEFAULT_BASE_URL: &str = "https://openrouter.ai";
const COMPLETIONS_PATH: &str = "/api/v1/chat/completions";

/// Sampling temperature. Extraction wants consistency, not creativity.
const TEMPERATURE: f64 = 0.1;

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

/// Chat-completions client for the model roster.
///
/// Use [`OpenRouterClient::new`] for production or
/// [`OpenRouterClient::with_base_url`] to point at a mock server in tests.
pub struct OpenRouterClient {
    client: Client,
    api_key: String,
    base_url: String,
    max_output_tokens: u32,
}

impl OpenRouterClient {
    /// Creates a client pointed at the production OpenRouter API.
    ///
    /// `timeout_secs` bounds each completion call; a timeout surfaces as
    /// [`LlmError::Http`] and feeds the rotation path.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        api_key: &str,
        timeout_secs: u64,
        max_output_tokens: u32,
    ) -> Result<Self, LlmError> {
        Self::with_base_url(api_key, timeout_secs, max_output_tokens, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        max_output_tokens: u32,
        base_url: &str,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("stockpulse/0.1 (stock-sentiment)")
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            max_output_tokens,
        })
    }

    async fn send_completion(
        &self,
        model: &ModelDescriptor,
        prompt: &str,
    ) -> Result<String, LlmError> {
        let url = format!("{}{COMPLETIONS_PATH}", self.base_url);
        let body = serde_json::json!({
            "model": model.id,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": self.max_output_tokens,
            "temperature": TEMPERATURE,
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited {
                model: model.id.clone(),
            });
        }
        let response = response.error_for_status()?;

        let parsed: ChatResponse = response.json().await?;

        if let Some(err) = parsed.error {
            return Err(LlmError::Api {
                model: model.id.clone(),
                message: err.message,
            });
        }

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(LlmError::Api {
                model: model.id.clone(),
                message: "response contained no choices".to_owned(),
            });
        }

        Ok(content)
    }
}

impl CompletionBackend for OpenRouterClient {
    async fn complete(&self, model: &ModelDescriptor, prompt: &str) -> Result<String, LlmError> {
        self.send_completion(model, prompt).await
    }
}
