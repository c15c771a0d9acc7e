//! # skillflow-foundation
//!
//! Foundation layer for Skillflow:
//! - Error: 중앙 에러 타입
//! - Config: 통합 설정 (SkillflowConfig, JsonStore)
//! - Event: 인스턴스별 이벤트 버스 (로그 라인, 사용자 태스크 요청)
//! - Deadline: 외부 호출용 취소 가능한 데드라인

pub mod config;
pub mod deadline;
pub mod error;
pub mod event;
pub mod storage;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{
    ProviderSettings, SkillflowConfig, TemperatureSettings, ENV_API_KEY, ENV_BASE_URL, ENV_MODEL,
    ENV_OPENAI_API_KEY, SKILLFLOW_CONFIG_FILE,
};

// ============================================================================
// Storage (저장소)
// ============================================================================
pub use storage::JsonStore;

// ============================================================================
// Event (이벤트 시스템)
// ============================================================================
pub use event::{
    EventBus, EventBusConfig, EventId, HumanTaskRequest, InstanceId, SkillEvent, SkillEventKind,
};

// ============================================================================
// Deadline
// ============================================================================
pub use deadline::Deadline;

// tokio-util 재노출
pub use tokio_util::sync::CancellationToken;
