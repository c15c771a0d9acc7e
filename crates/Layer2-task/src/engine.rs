//! Process engine boundary
//!
//! ```text
//! compile(name, definition) ──► RunnableProcess
//! run(listener)             ──► ActivityStart / Wait / ServiceCall / ActivityEnd …
//!                           ──► ExecutionSummary   (end)
//! ```

use crate::lifecycle::EngineListener;
use crate::node::{ActivityId, ActivityNode};
use crate::state::ExecutionState;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skillflow_foundation::Result;
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for one process run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessRunId(pub Uuid);

impl ProcessRunId {
    /// Generate a new random ProcessRunId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProcessRunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ProcessRunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Result of one process run (the `end(execution)` payload)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub run_id: ProcessRunId,

    /// Process name given at compile time
    pub process: String,

    pub state: ExecutionState,

    /// Activities that reached `ActivityEnd`, in order
    pub completed: Vec<ActivityId>,

    /// Activity whose failure ended the run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_activity: Option<ActivityId>,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ExecutionSummary {
    pub fn is_success(&self) -> bool {
        self.state.is_success()
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error()
    }
}

/// Compiles definition text into runnable processes
pub trait ProcessEngine: Send + Sync {
    /// Engine name (logging)
    fn name(&self) -> &str;

    /// Parse and validate a definition
    fn compile(&self, name: &str, definition: &str) -> Result<Box<dyn RunnableProcess>>;
}

/// One compiled, not yet started process
#[async_trait]
pub trait RunnableProcess: Send {
    /// Activities in definition order
    fn activities(&self) -> Vec<ActivityNode>;

    /// Run to the end, emitting lifecycle events to `listener`
    ///
    /// Activity failures end the run with `ExecutionState::Failed`; `Err` is
    /// reserved for engine faults.
    async fn run(self: Box<Self>, listener: Arc<dyn EngineListener>) -> Result<ExecutionSummary>;
}
