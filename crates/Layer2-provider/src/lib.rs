//! # skillflow-provider
//!
//! Completion service abstraction for Skillflow.
//!
//! ## Features
//! - Single request/response contract ([`CompletionClient`])
//! - OpenAI-compatible `/chat/completions` client
//! - Reasoning trace removal and JSON envelope parsing
//! - Scripted client for tests (`testing` feature)

pub mod error;
pub mod message;
pub mod output;
pub mod providers;
pub mod r#trait;

// Core traits and types
pub use message::{Message, MessageRole};
pub use r#trait::{CompletionClient, CompletionRequest};

// Output handling
pub use output::{parse_envelope, strip_fence, strip_reasoning, EnvelopeError, FenceTolerance};

// Error
pub use error::ProviderError;

// Implementations
pub use providers::OpenAiCompatClient;

#[cfg(any(test, feature = "testing"))]
pub use providers::ScriptedClient;
