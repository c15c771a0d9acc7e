//! Scripted completion client for tests
//!
//! Replies are queued up front and handed out in order; every request is
//! recorded so tests can assert on prompts, temperatures and call counts.

use crate::error::ProviderError;
use crate::r#trait::{CompletionClient, CompletionRequest};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

/// Completion client that replays queued responses
#[derive(Default)]
pub struct ScriptedClient {
    responses: Mutex<VecDeque<Result<String, ProviderError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
    delay: Option<Duration>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Client with the given text replies queued
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let client = Self::new();
        for reply in replies {
            client.push_reply(reply);
        }
        client
    }

    /// Sleep before every reply (deadline tests)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.responses.lock().push_back(Ok(reply.into()));
    }

    pub fn push_error(&self, error: ProviderError) {
        self.responses.lock().push_back(Err(error));
    }

    /// Number of `complete` calls so far
    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    /// Snapshot of recorded requests
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().len()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        self.requests.lock().push(request);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Unknown("script exhausted".to_string())))
    }
}
