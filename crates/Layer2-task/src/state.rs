//! Execution state machine

use serde::{Deserialize, Serialize};

/// Possible states of a process execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionState {
    /// Reached the end event
    Completed,

    /// An activity failed
    Failed(String),
}

impl ExecutionState {
    /// Check if execution completed successfully
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionState::Completed)
    }

    /// Failure message, if any
    pub fn error(&self) -> Option<&str> {
        match self {
            ExecutionState::Failed(msg) => Some(msg),
            ExecutionState::Completed => None,
        }
    }

    /// Get display name for the state
    pub fn display_name(&self) -> &'static str {
        match self {
            ExecutionState::Completed => "Completed",
            ExecutionState::Failed(_) => "Failed",
        }
    }
}

impl std::fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
