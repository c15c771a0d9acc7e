//! # skillflow-runtime
//!
//! Skill 실행 코어:
//! - `selector`: 사용자 입력 → 최대 한 개의 Skill
//! - `compiler`: Skill 본문 → BPMN 프로세스 정의
//! - `descriptor` / `environment`: 태스크 계약과 변수 환경
//! - `metadata` / `suspension`: 라이프사이클 리스너 상태 (설명자 캐시, 대기 태스크)
//! - `resolver`: LLM / 원격 도구 서비스 태스크
//! - `instance`: 인스턴스별 actor 와 호스트 핸들
//! - `runtime`: `SkillRuntime` 파사드
//!
//! ## 사용 예시
//!
//! ```ignore
//! let runtime = SkillRuntime::from_config(SkillflowConfig::load()?)?;
//!
//! if let Some(mut instance) = runtime.run("I want a refund").await? {
//!     let mut events = instance.subscribe();
//!     while let Ok(event) = events.recv().await {
//!         if let SkillEventKind::HumanTask(task) = &event.kind {
//!             instance.feedback(task.activity_id.as_str(), "yes").await?;
//!         }
//!         if event.is_finished() {
//!             break;
//!         }
//!     }
//!     let summary = instance.wait().await?;
//! }
//! ```

pub mod compiler;
pub mod descriptor;
pub mod environment;
pub mod instance;
pub mod metadata;
pub mod resolver;
pub mod runtime;
pub mod selector;
pub mod suspension;

// ============================================================================
// Facade
// ============================================================================
pub use runtime::{SkillRuntime, SkillRuntimeBuilder};

// ============================================================================
// Instance
// ============================================================================
pub use instance::{ExecutionInstance, InstanceHandle, InstanceSpec, FINISHED_LOG};

// ============================================================================
// Building blocks
// ============================================================================
pub use compiler::ProcessCompiler;
pub use descriptor::{TaskDescriptor, VariableRef, VariableType};
pub use environment::{VariableEnvironment, USER_INPUT};
pub use metadata::TaskMetadataCache;
pub use resolver::{
    LlmResolver, RemoteToolResolver, Resolution, ResolveRequest, ResolverSet, ServiceResolver,
    ToolPlan,
};
pub use selector::SkillSelector;
pub use suspension::{PendingTask, SuspensionCoordinator};
