//! Error types for Skillflow
//!
//! 모든 에러를 중앙에서 관리

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Skillflow 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // Skill 카탈로그 / 선택 / 컴파일
    // ========================================================================
    #[error("Skill catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("Skill selection failed: {0}")]
    SelectionFailure(String),

    #[error("Process compilation failed: {0}")]
    CompileFailure(String),

    // ========================================================================
    // 실행 인스턴스 관련
    // ========================================================================
    #[error("Invalid documentation for activity '{activity_id}': {message}")]
    MetadataParse {
        activity_id: String,
        message: String,
    },

    #[error("No pending human task for activity '{activity_id}'")]
    FeedbackMismatch { activity_id: String },

    #[error("Service task '{activity_id}' failed: {message}")]
    ServiceResolution {
        activity_id: String,
        message: String,
    },

    #[error("Engine error: {0}")]
    Engine(String),

    // ========================================================================
    // 외부 서비스
    // ========================================================================
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("MCP error: {0}")]
    Mcp(String),

    #[error("HTTP error: {0}")]
    Http(String),

    // ========================================================================
    // 실행 관련
    // ========================================================================
    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Cancelled")]
    Cancelled,

    // ========================================================================
    // 일반
    // ========================================================================
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Service task 에러 생성 헬퍼
    pub fn service(activity_id: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ServiceResolution {
            activity_id: activity_id.into(),
            message: message.into(),
        }
    }

    /// Feedback mismatch 에러 생성 헬퍼
    pub fn feedback_mismatch(activity_id: impl Into<String>) -> Self {
        Error::FeedbackMismatch {
            activity_id: activity_id.into(),
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}
