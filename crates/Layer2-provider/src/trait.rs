//! Completion client trait and request type
//!
//! The whole completion service is consumed through one request/response
//! contract; everything network-specific stays behind [`CompletionClient`].

use crate::error::ProviderError;
use crate::output::strip_reasoning;
use crate::Message;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use skillflow_foundation::Deadline;
use tracing::debug;

/// Single-turn completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Ordered conversation
    pub messages: Vec<Message>,

    /// Model override (None = client default)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    pub temperature: f32,

    /// Always false; streaming is not used by this layer
    pub stream: bool,
}

impl CompletionRequest {
    pub fn new(messages: Vec<Message>, temperature: f32) -> Self {
        Self {
            messages,
            model: None,
            temperature,
            stream: false,
        }
    }

    /// System + user 두 메시지 요청
    pub fn system_user(
        system: impl Into<String>,
        user: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self::new(vec![Message::system(system), Message::user(user)], temperature)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// 마지막 user 메시지 내용
    pub fn user_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == crate::MessageRole::User)
            .map(|m| m.content.as_str())
    }
}

/// Completion service client
///
/// Implement this trait to plug in another endpoint.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Default model used when the request carries none
    fn model(&self) -> &str;

    /// Send the request and return the raw text of the first choice
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError>;

    /// `complete` under a deadline, with the reasoning trace removed
    async fn complete_within(
        &self,
        request: CompletionRequest,
        deadline: &Deadline,
    ) -> skillflow_foundation::Result<String> {
        let raw = deadline.run("completion request", self.complete(request)).await??;
        let text = strip_reasoning(&raw);
        debug!(chars = text.len(), "Completion received");
        Ok(text)
    }
}
