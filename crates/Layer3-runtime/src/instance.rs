//! Execution instance
//!
//! 스킬 실행 하나당 actor 하나. 엔진 이벤트, 사용자 피드백, resolver 완료가
//! 모두 하나의 채널로 들어오고 도착 순서대로 처리됩니다. 환경 / 메타데이터 /
//! 대기 태스크는 actor 만 소유하므로 락이 필요 없습니다.
//!
//! ```text
//! engine ──Engine(event)──┐
//! host   ──Feedback───────┼──► mpsc ──► ExecutionInstance ──► EventBus ──► host
//! spawn  ──ResolverFinished┘
//! ```

use crate::environment::VariableEnvironment;
use crate::metadata::TaskMetadataCache;
use crate::resolver::{Resolution, ResolveRequest, ResolverSet};
use crate::suspension::SuspensionCoordinator;
use skillflow_foundation::{
    CancellationToken, Deadline, Error, EventBus, HumanTaskRequest, InstanceId, Result,
    SkillEvent, SkillEventKind,
};
use skillflow_task::{
    ActivityId, ActivityNode, EngineEvent, EngineListener, ExecutionSummary, ResumeHandle,
    RunnableProcess, ServiceBinding, ServiceCompletion,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Log line published when the process ends
pub const FINISHED_LOG: &str = "skill execution finished";

// ============================================================================
// Messages
// ============================================================================

/// Everything the instance reacts to
#[derive(Debug)]
pub enum InstanceMessage {
    Engine(EngineEvent),
    Feedback {
        activity_id: ActivityId,
        text: String,
        reply: oneshot::Sender<Result<()>>,
    },
    ResolverFinished {
        completion: ServiceCompletion,
        result: Result<Resolution>,
    },
    ProcessEnded(Result<ExecutionSummary>),
}

/// Forwards engine events into the instance channel
struct InstanceListener {
    tx: mpsc::UnboundedSender<InstanceMessage>,
}

impl EngineListener for InstanceListener {
    fn on_event(&self, event: EngineEvent) -> Result<()> {
        self.tx
            .send(InstanceMessage::Engine(event))
            .map_err(|_| Error::Cancelled)
    }
}

// ============================================================================
// ExecutionInstance
// ============================================================================

/// Settings fixed for the lifetime of one instance
pub struct InstanceSpec {
    pub skill_name: String,
    pub skill_body: Arc<str>,
    pub environment: VariableEnvironment,
    pub resolvers: ResolverSet,
    pub completion_timeout: Duration,
}

/// State owned by the instance actor
pub struct ExecutionInstance {
    id: InstanceId,
    skill_name: String,
    skill_body: Arc<str>,
    env: VariableEnvironment,
    metadata: TaskMetadataCache,
    suspension: SuspensionCoordinator,
    /// Waits with no hint: never answerable, held until the instance stops
    unannounced: Vec<ResumeHandle>,
    resolvers: ResolverSet,
    completion_timeout: Duration,
    bus: Arc<EventBus>,
    cancel: CancellationToken,
    tx: mpsc::UnboundedSender<InstanceMessage>,
}

impl ExecutionInstance {
    /// Start `process` and the actor that serves it
    pub fn spawn(spec: InstanceSpec, process: Box<dyn RunnableProcess>) -> InstanceHandle {
        let id = InstanceId::new();
        let bus = Arc::new(EventBus::new(id));
        let first_subscriber = bus.subscribe();
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::unbounded_channel();

        info!("Instance {} started for skill '{}'", id, spec.skill_name);

        let instance = Self {
            id,
            skill_name: spec.skill_name,
            skill_body: spec.skill_body,
            env: spec.environment,
            metadata: TaskMetadataCache::new(),
            suspension: SuspensionCoordinator::new(),
            unannounced: Vec::new(),
            resolvers: spec.resolvers,
            completion_timeout: spec.completion_timeout,
            bus: bus.clone(),
            cancel: cancel.clone(),
            tx: tx.clone(),
        };

        let listener = Arc::new(InstanceListener { tx: tx.clone() });
        let engine_tx = tx.clone();
        tokio::spawn(async move {
            let result = process.run(listener).await;
            let _ = engine_tx.send(InstanceMessage::ProcessEnded(result));
        });

        let join = tokio::spawn(instance.run(rx));

        InstanceHandle {
            id,
            tx,
            bus,
            cancel,
            first_subscriber: Some(first_subscriber),
            join,
        }
    }

    async fn run(
        mut self,
        mut rx: mpsc::UnboundedReceiver<InstanceMessage>,
    ) -> Result<ExecutionSummary> {
        let cancel = self.cancel.clone();
        let mut cancelled = false;

        loop {
            let message = tokio::select! {
                _ = cancel.cancelled(), if !cancelled => {
                    cancelled = true;
                    info!("Instance {} cancelled", self.id);
                    self.release_all();
                    continue;
                }
                message = rx.recv() => message,
            };

            // self 가 sender 를 들고 있으므로 None 은 오지 않음
            let Some(message) = message else {
                return Err(Error::Internal("instance channel closed".to_string()));
            };

            match message {
                InstanceMessage::Engine(event) => self.on_engine_event(event),
                InstanceMessage::Feedback {
                    activity_id,
                    text,
                    reply,
                } => {
                    let result = self.suspension.handle_feedback(
                        &activity_id,
                        &text,
                        &mut self.env,
                        &self.metadata,
                    );
                    if let Err(e) = &result {
                        debug!("Feedback rejected: {}", e);
                    }
                    let _ = reply.send(result);
                }
                InstanceMessage::ResolverFinished { completion, result } => {
                    self.on_resolver_finished(completion, result)
                }
                InstanceMessage::ProcessEnded(result) => return self.finish(result),
            }
        }
    }

    // ========================================================================
    // Engine events
    // ========================================================================

    fn on_engine_event(&mut self, event: EngineEvent) {
        debug!("Instance {} <- {} '{}'", self.id, event.name(), event.node().id);

        match event {
            EngineEvent::ActivityStart { node } => {
                if let Err(e) = self.metadata.record(&node) {
                    self.bus.log(format!("activity '{}' has invalid documentation", node.label()));
                    debug!("{}", e);
                }
            }
            EngineEvent::Wait { node, resume } => self.on_wait(node, resume),
            EngineEvent::ServiceCall {
                node,
                binding,
                completion,
            } => self.on_service_call(node, binding, completion),
            EngineEvent::ActivityEnd { node } => {
                if let Some(name) = node.name.as_deref().filter(|n| !n.trim().is_empty()) {
                    self.bus.log(format!("activity finished: {}", name));
                }
            }
        }
    }

    fn on_wait(&mut self, node: ActivityNode, resume: ResumeHandle) {
        if self.cancel.is_cancelled() {
            let _ = resume.fail(Error::Cancelled);
            return;
        }

        let request = match self.metadata.lookup(&node.id) {
            Ok(descriptor) => descriptor.filter(|d| d.has_hint()).map(|d| HumanTaskRequest {
                activity_id: node.id.to_string(),
                hint: d.hint.clone(),
                current_input_text: d
                    .input
                    .non_empty_name()
                    .and_then(|name| self.env.render(name))
                    .unwrap_or_default(),
            }),
            Err(e) => {
                warn!("Human task '{}' failed: {}", node.id, e);
                let _ = resume.fail(e);
                return;
            }
        };

        match request {
            Some(request) => {
                if self.suspension.park(resume).is_ok() {
                    self.bus.publish(SkillEventKind::HumanTask(request));
                }
            }
            None => {
                // 힌트 없음: 요청을 내보내지 않고 등록도 하지 않음 (피드백 불가)
                self.bus
                    .log(format!("activity '{}' is waiting for feedback", node.label()));
                self.unannounced.push(resume);
            }
        }
    }

    fn on_service_call(
        &mut self,
        node: ActivityNode,
        binding: ServiceBinding,
        completion: ServiceCompletion,
    ) {
        if self.cancel.is_cancelled() {
            let _ = completion.fail(Error::Cancelled);
            return;
        }

        let descriptor = match self.metadata.lookup(&node.id) {
            Ok(descriptor) => descriptor.cloned(),
            Err(e) => {
                warn!("Service task '{}' failed: {}", node.id, e);
                let _ = completion.fail(e);
                return;
            }
        };

        let Some(resolver) = self.resolvers.for_binding(binding) else {
            debug!("Script task '{}' completed", node.id);
            let _ = completion.complete();
            return;
        };

        debug!("Dispatching '{}' to {}", node.id, resolver.name());
        let request = ResolveRequest {
            node,
            descriptor,
            skill_body: self.skill_body.clone(),
            environment: self.env.clone(),
            deadline: Deadline::new(self.completion_timeout, self.cancel.child_token()),
        };
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let result = resolver.resolve(request).await;
            let _ = tx.send(InstanceMessage::ResolverFinished { completion, result });
        });
    }

    fn on_resolver_finished(&mut self, completion: ServiceCompletion, result: Result<Resolution>) {
        let activity_id = completion.activity_id().clone();

        let outcome = result.and_then(|resolution| {
            if let Some(path) = &resolution.resource_path {
                debug!("Activity '{}' resource hint: {}", activity_id, path);
            }
            match resolution.binding {
                Some((name, value)) => self.env.set(&name, value),
                None => Ok(()),
            }
        });

        if let Err(e) = &outcome {
            warn!("Service task '{}' failed: {}", activity_id, e);
            self.bus.log(format!("activity '{}' failed: {}", activity_id, e));
        }

        if completion.finish(outcome).is_err() {
            debug!("Engine stopped waiting on '{}'", activity_id);
        }
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    fn finish(mut self, result: Result<ExecutionSummary>) -> Result<ExecutionSummary> {
        let error = match &result {
            Ok(summary) => summary.error().map(str::to_string),
            Err(e) => Some(e.to_string()),
        };

        match &error {
            None => info!("Instance {} ('{}') finished", self.id, self.skill_name),
            Some(e) => warn!("Instance {} ('{}') finished with error: {}", self.id, self.skill_name, e),
        }

        self.bus.log(FINISHED_LOG);
        self.bus.publish(SkillEventKind::Finished { error });

        self.cancel.cancel();
        self.release_all();
        result
    }

    /// Fail every parked wait with `Cancelled`
    fn release_all(&mut self) {
        self.suspension.fail_all(|| Error::Cancelled);
        for resume in self.unannounced.drain(..) {
            let _ = resume.fail(Error::Cancelled);
        }
    }
}

// ============================================================================
// InstanceHandle
// ============================================================================

/// Host-side handle of a running instance
pub struct InstanceHandle {
    id: InstanceId,
    tx: mpsc::UnboundedSender<InstanceMessage>,
    bus: Arc<EventBus>,
    cancel: CancellationToken,
    first_subscriber: Option<broadcast::Receiver<SkillEvent>>,
    join: JoinHandle<Result<ExecutionSummary>>,
}

impl InstanceHandle {
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Event stream of this instance
    ///
    /// The first call returns a receiver created before the process started,
    /// so it sees every event.
    pub fn subscribe(&mut self) -> broadcast::Receiver<SkillEvent> {
        self.first_subscriber
            .take()
            .unwrap_or_else(|| self.bus.subscribe())
    }

    /// Recent events (oldest first)
    pub fn history(&self) -> Vec<SkillEvent> {
        self.bus.history()
    }

    /// Answer a suspended human task
    ///
    /// Fails with `FeedbackMismatch` when the activity is not waiting, or the
    /// instance has already ended.
    pub async fn feedback(
        &self,
        activity_id: impl Into<ActivityId>,
        text: impl Into<String>,
    ) -> Result<()> {
        let activity_id = activity_id.into();
        let (reply, rx) = oneshot::channel();

        self.tx
            .send(InstanceMessage::Feedback {
                activity_id: activity_id.clone(),
                text: text.into(),
                reply,
            })
            .map_err(|_| Error::feedback_mismatch(activity_id.as_str()))?;

        rx.await
            .map_err(|_| Error::feedback_mismatch(activity_id.as_str()))?
    }

    /// Stop the instance: outstanding human tasks and in-flight calls fail
    /// with `Cancelled`
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the process to end
    pub async fn wait(self) -> Result<ExecutionSummary> {
        self.join
            .await
            .map_err(|e| Error::Internal(format!("instance task failed: {}", e)))?
    }
}
