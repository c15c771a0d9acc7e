//! Sequential BPMN engine
//!
//! 컴파일된 실행 순서를 따라 한 액티비티씩 진행합니다. 사람 태스크와 서비스
//! 태스크에서는 핸들이 신호를 줄 때까지 멈춥니다.

use super::parser::parse_definition;
use crate::engine::{ExecutionSummary, ProcessEngine, ProcessRunId, RunnableProcess};
use crate::lifecycle::{EngineEvent, EngineListener, OutcomeReceiver, ResumeHandle, ServiceCompletion};
use crate::node::{ActivityId, ActivityKind, ActivityNode};
use crate::state::ExecutionState;
use async_trait::async_trait;
use chrono::Utc;
use skillflow_foundation::{Error, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Reference engine for sequential BPMN 2.0 processes
#[derive(Debug, Default, Clone)]
pub struct SequentialEngine;

impl SequentialEngine {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessEngine for SequentialEngine {
    fn name(&self) -> &str {
        "sequential-bpmn"
    }

    fn compile(&self, name: &str, definition: &str) -> Result<Box<dyn RunnableProcess>> {
        let parsed = parse_definition(definition)?;
        let order = parsed.execution_order()?;
        debug!(
            "Compiled process '{}' ({} activities, {} in run order)",
            name,
            parsed.nodes.len(),
            order.len()
        );

        Ok(Box::new(SequentialProcess {
            name: name.to_string(),
            order,
        }))
    }
}

/// Compiled sequential process
pub struct SequentialProcess {
    name: String,
    order: Vec<ActivityNode>,
}

impl SequentialProcess {
    /// 핸들 신호 대기
    async fn await_outcome(activity_id: &ActivityId, rx: OutcomeReceiver) -> Result<()> {
        rx.await.map_err(|_| {
            Error::Engine(format!(
                "Handle for activity '{}' was dropped without a signal",
                activity_id
            ))
        })?
    }
}

#[async_trait]
impl RunnableProcess for SequentialProcess {
    fn activities(&self) -> Vec<ActivityNode> {
        self.order.clone()
    }

    async fn run(self: Box<Self>, listener: Arc<dyn EngineListener>) -> Result<ExecutionSummary> {
        let run_id = ProcessRunId::new();
        let started_at = Utc::now();
        let mut completed = Vec::new();
        let mut failure = None;

        info!("Process '{}' run {} started", self.name, run_id);

        for node in &self.order {
            listener.on_event(EngineEvent::ActivityStart { node: node.clone() })?;

            let outcome = match &node.kind {
                ActivityKind::UserTask => {
                    let (resume, rx) = ResumeHandle::new(node.id.clone());
                    listener.on_event(EngineEvent::Wait {
                        node: node.clone(),
                        resume,
                    })?;
                    Self::await_outcome(&node.id, rx).await
                }
                ActivityKind::ServiceTask | ActivityKind::ScriptTask => {
                    let binding = node.binding.ok_or_else(|| {
                        Error::Engine(format!("Activity '{}' has no service binding", node.id))
                    })?;
                    let (completion, rx) = ServiceCompletion::new(node.id.clone());
                    listener.on_event(EngineEvent::ServiceCall {
                        node: node.clone(),
                        binding,
                        completion,
                    })?;
                    Self::await_outcome(&node.id, rx).await
                }
                _ => Ok(()),
            };

            if let Err(e) = outcome {
                if matches!(e, Error::Cancelled) {
                    return Err(e);
                }
                warn!("Activity '{}' failed: {}", node.id, e);
                failure = Some((node.id.clone(), e.to_string()));
                break;
            }

            listener.on_event(EngineEvent::ActivityEnd { node: node.clone() })?;
            completed.push(node.id.clone());
        }

        let (state, failed_activity) = match failure {
            Some((id, message)) => (ExecutionState::Failed(message), Some(id)),
            None => (ExecutionState::Completed, None),
        };
        info!("Process '{}' run {} ended: {}", self.name, run_id, state);

        Ok(ExecutionSummary {
            run_id,
            process: self.name,
            state,
            completed,
            failed_activity,
            started_at,
            finished_at: Utc::now(),
        })
    }
}
