//! Service task resolvers
//!
//! ```text
//! ServiceCall(llmService) ──► LlmResolver        ──► Resolution
//! ServiceCall(mcpService) ──► RemoteToolResolver ──► Resolution
//! ```
//!
//! Resolvers never touch the live environment. They get a snapshot and hand
//! back the variable to bind; the instance applies it.

mod llm;
mod remote_tool;

pub use llm::LlmResolver;
pub use remote_tool::{RemoteToolResolver, ToolPlan};

use crate::descriptor::TaskDescriptor;
use crate::environment::VariableEnvironment;
use async_trait::async_trait;
use serde_json::Value;
use skillflow_foundation::{Deadline, Result};
use skillflow_task::{ActivityNode, ServiceBinding};
use std::sync::Arc;

/// Everything a resolver may read
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    pub node: ActivityNode,

    /// Parsed documentation, if the activity has one
    pub descriptor: Option<TaskDescriptor>,

    /// Instance-constant skill body
    pub skill_body: Arc<str>,

    /// Environment at dispatch time
    pub environment: VariableEnvironment,

    /// Shares the instance's cancellation token
    pub deadline: Deadline,
}

/// Resolver result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Variable to write (name, value)
    pub binding: Option<(String, Value)>,

    /// Extra resource the model asked for (logged only)
    pub resource_path: Option<String>,

    /// Raw result text, for log lines
    pub result_text: String,
}

impl Resolution {
    pub fn bind(name: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = value.into();
        Self {
            result_text: render_value(&value),
            binding: Some((name.into(), value)),
            resource_path: None,
        }
    }

    /// Result with nowhere to go
    pub fn unbound(value: &Value) -> Self {
        Self {
            result_text: render_value(value),
            ..Default::default()
        }
    }

    pub fn with_resource_path(mut self, path: Option<String>) -> Self {
        self.resource_path = path.filter(|p| !p.trim().is_empty());
        self
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Automated task implementation
#[async_trait]
pub trait ServiceResolver: Send + Sync {
    /// Service name this resolver answers to
    fn name(&self) -> &'static str;

    async fn resolve(&self, request: ResolveRequest) -> Result<Resolution>;
}

/// The two resolver implementations an instance dispatches to
#[derive(Clone)]
pub struct ResolverSet {
    pub llm: Arc<dyn ServiceResolver>,
    pub remote_tool: Arc<dyn ServiceResolver>,
}

impl ResolverSet {
    pub fn new(llm: Arc<dyn ServiceResolver>, remote_tool: Arc<dyn ServiceResolver>) -> Self {
        Self { llm, remote_tool }
    }

    /// `None` for script tasks (built-in no-op)
    pub fn for_binding(&self, binding: ServiceBinding) -> Option<Arc<dyn ServiceResolver>> {
        match binding {
            ServiceBinding::Llm => Some(self.llm.clone()),
            ServiceBinding::RemoteTool => Some(self.remote_tool.clone()),
            ServiceBinding::Script => None,
        }
    }
}
