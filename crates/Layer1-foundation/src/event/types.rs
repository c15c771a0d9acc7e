//! Event Types - 실행 인스턴스가 호스트에게 보내는 이벤트 정의

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// IDs
// ============================================================================

/// 이벤트 고유 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

impl EventId {
    /// 새 이벤트 ID 생성
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 실행 인스턴스 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub uuid::Uuid);

impl InstanceId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // 로그 가독성을 위해 앞 8자리만
        let full = self.0.to_string();
        write!(f, "{}", &full[..8])
    }
}

// ============================================================================
// SkillEvent
// ============================================================================

/// Outbound prompt for a suspended human task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanTaskRequest {
    pub activity_id: String,
    pub hint: String,
    /// Current value of the task's declared input variable, rendered as text
    pub current_input_text: String,
}

/// 이벤트 종류
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SkillEventKind {
    /// 진행 로그 (휘발성)
    Log { text: String },

    /// 사용자 입력이 필요한 태스크
    HumanTask(HumanTaskRequest),

    /// 인스턴스 종료
    Finished {
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

/// 실행 인스턴스 이벤트
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillEvent {
    pub id: EventId,
    pub instance_id: InstanceId,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: SkillEventKind,
}

impl SkillEvent {
    pub fn new(instance_id: InstanceId, kind: SkillEventKind) -> Self {
        Self {
            id: EventId::new(),
            instance_id,
            timestamp: Utc::now(),
            kind,
        }
    }

    pub fn log(instance_id: InstanceId, text: impl Into<String>) -> Self {
        Self::new(instance_id, SkillEventKind::Log { text: text.into() })
    }

    /// 로그 텍스트 (로그 이벤트인 경우)
    pub fn log_text(&self) -> Option<&str> {
        match &self.kind {
            SkillEventKind::Log { text } => Some(text),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.kind, SkillEventKind::Finished { .. })
    }
}
