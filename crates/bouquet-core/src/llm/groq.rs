//! Groq client over the OpenAI-compatible `/chat/completions` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::types::CompletionBody;
use super::{ChatClient, ChatRequest, ChatResponse, LlmConfig, LlmError};

/// Groq chat-completions client.
///
/// Built once at startup and shared; the underlying `reqwest::Client`
/// pools connections and enforces the configured request timeout.
pub struct GroqClient {
    api_key: String,
    base_url: String,
    http: Client,
    timeout: Duration,
}

impl GroqClient {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(?config, "GroqClient::new: called");
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(LlmError::Network)?;

        Ok(Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            http,
            timeout: config.timeout,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn classify(&self, err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            LlmError::Timeout(self.timeout)
        } else {
            LlmError::Network(err)
        }
    }
}

#[async_trait]
impl ChatClient for GroqClient {
    fn name(&self) -> &str {
        "groq"
    }

    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        debug!(model = %request.model, messages = request.messages.len(), "complete: called");

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), "complete: API error");
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.classify(e))?;
        let body: CompletionBody = serde_json::from_slice(&bytes)?;
        debug!(choices = body.choices.len(), "complete: success");
        Ok(body.into())
    }
}
