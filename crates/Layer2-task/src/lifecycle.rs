//! Activity lifecycle events and resume primitives
//!
//! 엔진은 각 노드마다 `ActivityStart` → (`Wait` | `ServiceCall`) → `ActivityEnd`
//! 순서로 이벤트를 보냅니다. `Wait`/`ServiceCall` 은 oneshot 핸들을 싣고 있고,
//! 엔진은 핸들이 신호를 줄 때까지 해당 액티비티에서 멈춥니다.

use crate::node::{ActivityId, ActivityNode, ServiceBinding};
use skillflow_foundation::{Error, Result};
use tokio::sync::{mpsc, oneshot};

/// Outcome delivered through a handle
pub type ActivityOutcome = Result<()>;

/// Receiving side held by the engine
pub type OutcomeReceiver = oneshot::Receiver<ActivityOutcome>;

fn signal(
    tx: oneshot::Sender<ActivityOutcome>,
    activity_id: &ActivityId,
    outcome: ActivityOutcome,
) -> Result<()> {
    tx.send(outcome).map_err(|_| {
        Error::Engine(format!(
            "Process is no longer waiting on activity '{}'",
            activity_id
        ))
    })
}

// ============================================================================
// ResumeHandle
// ============================================================================

/// Unblocks a suspended human task
#[derive(Debug)]
pub struct ResumeHandle {
    activity_id: ActivityId,
    tx: oneshot::Sender<ActivityOutcome>,
}

impl ResumeHandle {
    pub fn new(activity_id: ActivityId) -> (Self, OutcomeReceiver) {
        let (tx, rx) = oneshot::channel();
        (Self { activity_id, tx }, rx)
    }

    pub fn activity_id(&self) -> &ActivityId {
        &self.activity_id
    }

    /// 태스크 재개 (소비됨 - 정확히 한 번)
    pub fn resume(self) -> Result<()> {
        signal(self.tx, &self.activity_id, Ok(()))
    }

    /// 태스크 실패로 종료
    pub fn fail(self, error: Error) -> Result<()> {
        signal(self.tx, &self.activity_id, Err(error))
    }
}

// ============================================================================
// ServiceCompletion
// ============================================================================

/// Completion callback for an automated task
#[derive(Debug)]
pub struct ServiceCompletion {
    activity_id: ActivityId,
    tx: oneshot::Sender<ActivityOutcome>,
}

impl ServiceCompletion {
    pub fn new(activity_id: ActivityId) -> (Self, OutcomeReceiver) {
        let (tx, rx) = oneshot::channel();
        (Self { activity_id, tx }, rx)
    }

    pub fn activity_id(&self) -> &ActivityId {
        &self.activity_id
    }

    pub fn complete(self) -> Result<()> {
        signal(self.tx, &self.activity_id, Ok(()))
    }

    /// Task-failure callback
    pub fn fail(self, error: Error) -> Result<()> {
        signal(self.tx, &self.activity_id, Err(error))
    }

    /// 결과에 따라 complete / fail
    pub fn finish(self, outcome: ActivityOutcome) -> Result<()> {
        signal(self.tx, &self.activity_id, outcome)
    }
}

// ============================================================================
// EngineEvent
// ============================================================================

/// Lifecycle event emitted by a running process
#[derive(Debug)]
pub enum EngineEvent {
    ActivityStart {
        node: ActivityNode,
    },
    /// Human task suspended
    Wait {
        node: ActivityNode,
        resume: ResumeHandle,
    },
    /// Automated task waiting for its resolver
    ServiceCall {
        node: ActivityNode,
        binding: ServiceBinding,
        completion: ServiceCompletion,
    },
    ActivityEnd {
        node: ActivityNode,
    },
}

impl EngineEvent {
    pub fn node(&self) -> &ActivityNode {
        match self {
            Self::ActivityStart { node }
            | Self::Wait { node, .. }
            | Self::ServiceCall { node, .. }
            | Self::ActivityEnd { node } => node,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ActivityStart { .. } => "activity.start",
            Self::Wait { .. } => "wait",
            Self::ServiceCall { .. } => "service.call",
            Self::ActivityEnd { .. } => "activity.end",
        }
    }
}

/// Receives lifecycle events from a running process
pub trait EngineListener: Send + Sync {
    /// Deliver one event; an error means the listener is gone
    fn on_event(&self, event: EngineEvent) -> Result<()>;
}

impl EngineListener for mpsc::UnboundedSender<EngineEvent> {
    fn on_event(&self, event: EngineEvent) -> Result<()> {
        self.send(event).map_err(|_| Error::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resume_delivers_once() {
        let (handle, rx) = ResumeHandle::new(ActivityId::from("Task_1"));
        assert_eq!(handle.activity_id().as_str(), "Task_1");

        handle.resume().unwrap();
        assert!(rx.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_fail_carries_error() {
        let (completion, rx) = ServiceCompletion::new(ActivityId::from("Svc"));
        completion
            .fail(Error::service("Svc", "model unavailable"))
            .unwrap();

        let outcome = rx.await.unwrap();
        assert!(matches!(outcome, Err(Error::ServiceResolution { .. })));
    }

    #[test]
    fn test_resume_after_engine_gone() {
        let (handle, rx) = ResumeHandle::new(ActivityId::from("Task_1"));
        drop(rx);
        assert!(matches!(handle.resume(), Err(Error::Engine(_))));
    }
}
