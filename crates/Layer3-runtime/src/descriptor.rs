//! Task descriptor (the documentation block of one activity)
//!
//! ```json
//! {
//!   "hint": "Please confirm the refund amount",
//!   "prompt": "Summarize the order",
//!   "input":  { "name": "order",   "type": "text" },
//!   "output": { "name": "summary", "type": "text" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use skillflow_provider::{parse_envelope, EnvelopeError, FenceTolerance};
use std::fmt;

// ============================================================================
// VariableType
// ============================================================================

/// Declared type of a task variable
///
/// The type is advisory: it is passed to the model, never enforced.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VariableType {
    #[default]
    Text,
    Number,
    Boolean,
    Collection,
    /// 알 수 없는 라벨 (그대로 보존)
    Other(String),
}

impl VariableType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Collection => "collection",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for VariableType {
    fn from(label: String) -> Self {
        match label.trim() {
            "" | "text" | "string" | "文本" => Self::Text,
            "number" | "数字" => Self::Number,
            "boolean" | "bool" | "布尔" => Self::Boolean,
            "collection" | "array" | "list" | "集合" => Self::Collection,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<VariableType> for String {
    fn from(var_type: VariableType) -> Self {
        var_type.as_str().to_string()
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// VariableRef / TaskDescriptor
// ============================================================================

/// `{name, type}` pair naming one variable
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VariableRef {
    #[serde(default)]
    pub name: String,

    #[serde(default, rename = "type")]
    pub var_type: VariableType,
}

impl VariableRef {
    pub fn new(name: impl Into<String>, var_type: VariableType) -> Self {
        Self {
            name: name.into(),
            var_type,
        }
    }

    /// 이름이 비어 있지 않은 경우에만
    pub fn non_empty_name(&self) -> Option<&str> {
        let name = self.name.trim();
        (!name.is_empty()).then_some(name)
    }
}

/// Parsed documentation block of one activity
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskDescriptor {
    #[serde(default)]
    pub hint: String,

    #[serde(default)]
    pub prompt: String,

    #[serde(default)]
    pub input: VariableRef,

    #[serde(default)]
    pub output: VariableRef,
}

impl TaskDescriptor {
    /// Parse a documentation block
    ///
    /// The block must be the JSON document itself; fenced blocks are rejected.
    pub fn parse(documentation: &str) -> Result<Self, EnvelopeError> {
        parse_envelope(documentation, FenceTolerance::Strict)
    }

    /// Encode as a documentation block
    pub fn to_documentation(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn has_hint(&self) -> bool {
        !self.hint.trim().is_empty()
    }
}
