//! Completion client implementations

pub mod openai;

#[cfg(any(test, feature = "testing"))]
pub mod scripted;

pub use openai::OpenAiCompatClient;

#[cfg(any(test, feature = "testing"))]
pub use scripted::ScriptedClient;
