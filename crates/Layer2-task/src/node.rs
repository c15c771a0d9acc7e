//! Activity node - 엔진 고유 형태와 분리된 좁은 노드 인터페이스

use serde::{Deserialize, Serialize};
use std::fmt;

/// Activity identifier (unique within one process definition)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(String);

impl ActivityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActivityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ActivityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for ActivityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Kind of activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityKind {
    StartEvent,
    EndEvent,
    /// Human task: suspends until feedback arrives
    UserTask,
    /// Automated task bound to a resolver
    ServiceTask,
    ScriptTask,
    /// Any other pass-through activity (plain `task`, intermediate events)
    Other(String),
}

impl ActivityKind {
    /// BPMN 요소 이름에서 변환
    pub fn from_element(local_name: &str) -> Self {
        match local_name {
            "startEvent" => Self::StartEvent,
            "endEvent" => Self::EndEvent,
            "userTask" => Self::UserTask,
            "serviceTask" => Self::ServiceTask,
            "scriptTask" => Self::ScriptTask,
            other => Self::Other(other.to_string()),
        }
    }

}

/// Resolver a service task is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServiceBinding {
    /// Language-model reasoning (`llmService`)
    Llm,
    /// Remote tool call (`mcpService`)
    RemoteTool,
    /// Built-in script handler
    Script,
}

impl ServiceBinding {
    /// Service name used in `implementation="${environment.services.<name>}"`
    pub fn service_name(&self) -> &'static str {
        match self {
            Self::Llm => "llmService",
            Self::RemoteTool => "mcpService",
            Self::Script => "scriptService",
        }
    }

    /// `implementation` 속성 값에서 바인딩 추출
    pub fn from_implementation(implementation: &str) -> Option<Self> {
        let name = implementation
            .trim()
            .trim_start_matches("${")
            .trim_end_matches('}')
            .rsplit('.')
            .next()
            .unwrap_or_default();

        match name {
            "llmService" => Some(Self::Llm),
            "mcpService" => Some(Self::RemoteTool),
            "scriptService" => Some(Self::Script),
            _ => None,
        }
    }
}

impl fmt::Display for ServiceBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.service_name())
    }
}

/// Adapter-produced node handed to lifecycle listeners
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityNode {
    pub id: ActivityId,
    pub kind: ActivityKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Raw documentation block (expected to be TaskDescriptor JSON)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,

    /// Resolver binding for automated tasks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<ServiceBinding>,
}

impl ActivityNode {
    pub fn new(id: impl Into<ActivityId>, kind: ActivityKind) -> Self {
        Self {
            id: id.into(),
            kind,
            name: None,
            documentation: None,
            binding: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = Some(documentation.into());
        self
    }

    pub fn with_binding(mut self, binding: ServiceBinding) -> Self {
        self.binding = Some(binding);
        self
    }

    /// 이름이 없으면 id
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(self.id.as_str())
    }
}
