//! Config - 통합 설정 관리
//!
//! - `skillflow.rs` - SkillflowConfig 통합 설정 (글로벌 + 프로젝트 병합, 환경 변수 오버라이드)

mod skillflow;

pub use skillflow::{
    ProviderSettings, SkillflowConfig, TemperatureSettings, ENV_API_KEY, ENV_BASE_URL, ENV_MODEL,
    ENV_OPENAI_API_KEY, SKILLFLOW_CONFIG_FILE,
};
