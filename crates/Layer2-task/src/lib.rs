//! # skillflow-task
//!
//! Process engine boundary for Skillflow.
//!
//! ## Features
//!
//! - Narrow activity node interface (`ActivityNode`)
//! - Lifecycle events with resume / completion handles
//! - `ProcessEngine` / `RunnableProcess` traits
//! - Reference sequential BPMN 2.0 engine

pub mod bpmn;
pub mod engine;
pub mod lifecycle;
pub mod node;
pub mod state;

// Engine boundary
pub use engine::{ExecutionSummary, ProcessEngine, ProcessRunId, RunnableProcess};
pub use lifecycle::{
    ActivityOutcome, EngineEvent, EngineListener, OutcomeReceiver, ResumeHandle, ServiceCompletion,
};
pub use node::{ActivityId, ActivityKind, ActivityNode, ServiceBinding};
pub use state::ExecutionState;

// Reference engine
pub use bpmn::{parse_definition, ProcessDefinition, SequentialEngine};
