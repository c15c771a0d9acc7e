//! OpenAI-compatible chat completion client
//!
//! Any endpoint speaking `/chat/completions` (OpenAI, vLLM, Ollama, LM Studio,
//! DeepSeek...) works; the base URL comes from configuration.

use crate::{
    error::ProviderError,
    r#trait::{CompletionClient, CompletionRequest},
    Message,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use skillflow_foundation::ProviderSettings;
use std::time::Duration;
use tracing::debug;

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// OpenAI-compatible completion client
pub struct OpenAiCompatClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiCompatClient {
    /// Create a new client
    ///
    /// Request deadlines are applied per call by the caller; only the connect
    /// phase is bounded here.
    pub fn new(
        base_url: impl AsRef<str>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            endpoint: Self::endpoint_for(base_url.as_ref()),
        })
    }

    /// Create from configuration
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        Self::new(
            settings.effective_base_url(),
            settings.api_key.clone().unwrap_or_default(),
            settings.effective_model(),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn endpoint_for(base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');
        if base.ends_with(CHAT_COMPLETIONS_PATH) {
            base.to_string()
        } else {
            format!("{}{}", base, CHAT_COMPLETIONS_PATH)
        }
    }

    fn build_request(&self, request: &CompletionRequest) -> OpenAiRequest {
        OpenAiRequest {
            model: request.model.clone().unwrap_or_else(|| self.model.clone()),
            messages: request.messages.iter().map(OpenAiMessage::from).collect(),
            temperature: request.temperature,
            stream: false,
        }
    }

    /// Parse error response from the API
    fn parse_error_response(status: reqwest::StatusCode, body: &str) -> ProviderError {
        if let Ok(error_response) = serde_json::from_str::<OpenAiErrorResponse>(body) {
            let error = error_response.error;
            let message = error.message;

            return match error.code.as_deref() {
                Some("rate_limit_exceeded") => ProviderError::RateLimited(message),
                Some("context_length_exceeded") => ProviderError::ContextLengthExceeded(message),
                Some("invalid_api_key") => ProviderError::Authentication(message),
                Some("model_not_found") => ProviderError::ModelNotAvailable(message),
                _ => ProviderError::from_http_status(status.as_u16(), &message),
            };
        }

        ProviderError::from_http_status(status.as_u16(), body)
    }

    /// Extract the first choice's text
    fn first_choice_text(response: OpenAiResponse) -> Result<String, ProviderError> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("No choices in response".to_string()))?;

        let content = match choice.message.content {
            Some(OpenAiContent::Text(text)) => text,
            Some(OpenAiContent::Parts(parts)) => parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join(""),
            None => String::new(),
        };

        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompatClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        let body = self.build_request(&request);
        debug!(model = %body.model, messages = body.messages.len(), "Sending completion request");

        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json");
        if !self.api_key.is_empty() {
            builder = builder.header("Authorization", format!("Bearer {}", self.api_key));
        }

        let response = builder
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::parse_error_response(status, &body));
        }

        let api_response: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Self::first_choice_text(api_response)
    }
}

// ============================================================================
// OpenAI API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<OpenAiContent>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum OpenAiContent {
    Text(String),
    Parts(Vec<OpenAiContentPart>),
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiContentPart {
    #[serde(rename = "type")]
    part_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiError,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    message: String,
    code: Option<String>,
}

impl From<&Message> for OpenAiMessage {
    fn from(msg: &Message) -> Self {
        OpenAiMessage {
            role: msg.role.as_str().to_string(),
            content: Some(OpenAiContent::Text(msg.content.clone())),
        }
    }
}
