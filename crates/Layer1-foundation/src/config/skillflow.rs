//! Skillflow Config - 통합 설정
//!
//! 로드 순서: 기본값 → 글로벌 → 프로젝트 → 환경 변수 (CLI 플래그는 호출자가 적용)

use crate::storage::JsonStore;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// 설정 파일명
pub const SKILLFLOW_CONFIG_FILE: &str = "config.json";

/// 환경 변수
pub const ENV_API_KEY: &str = "SKILLFLOW_API_KEY";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_BASE_URL: &str = "SKILLFLOW_BASE_URL";
pub const ENV_MODEL: &str = "SKILLFLOW_MODEL";

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

// ============================================================================
// Provider
// ============================================================================

/// Completion 서비스 접속 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ProviderSettings {
    pub fn effective_base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn effective_model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    fn merge(&mut self, other: ProviderSettings) {
        if other.base_url.is_some() {
            self.base_url = other.base_url;
        }
        if other.api_key.is_some() {
            self.api_key = other.api_key;
        }
        if other.model.is_some() {
            self.model = other.model;
        }
    }
}

// ============================================================================
// Temperatures
// ============================================================================

/// 호출 종류별 temperature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemperatureSettings {
    pub selection: f32,
    pub compile: f32,
    pub llm_task: f32,
    pub remote_tool_analysis: f32,
}

impl Default for TemperatureSettings {
    fn default() -> Self {
        Self {
            selection: 0.1,
            compile: 0.3,
            llm_task: 0.7,
            remote_tool_analysis: 0.7,
        }
    }
}

// ============================================================================
// SkillflowConfig
// ============================================================================

/// Skillflow 통합 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillflowConfig {
    #[serde(default)]
    pub provider: ProviderSettings,

    #[serde(default)]
    pub temperatures: TemperatureSettings,

    /// Skill 디렉토리 (기본: ./.skills)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills_dir: Option<PathBuf>,

    /// 카탈로그 캐시 TTL (밀리초)
    #[serde(default = "default_catalog_ttl_ms")]
    pub catalog_ttl_ms: u64,

    /// Completion 호출 데드라인 (초)
    #[serde(default = "default_completion_timeout")]
    pub completion_timeout_secs: u64,

    /// 원격 도구 호출 데드라인 (초)
    #[serde(default = "default_remote_tool_timeout")]
    pub remote_tool_timeout_secs: u64,
}

fn default_catalog_ttl_ms() -> u64 {
    5000
}

fn default_completion_timeout() -> u64 {
    120
}

fn default_remote_tool_timeout() -> u64 {
    60
}

impl Default for SkillflowConfig {
    fn default() -> Self {
        Self {
            provider: ProviderSettings::default(),
            temperatures: TemperatureSettings::default(),
            skills_dir: None,
            catalog_ttl_ms: default_catalog_ttl_ms(),
            completion_timeout_secs: default_completion_timeout(),
            remote_tool_timeout_secs: default_remote_tool_timeout(),
        }
    }
}

/// 파일에 부분적으로만 적힌 설정 (병합용)
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartialConfig {
    #[serde(default)]
    provider: ProviderSettings,
    temperatures: Option<TemperatureSettings>,
    skills_dir: Option<PathBuf>,
    catalog_ttl_ms: Option<u64>,
    completion_timeout_secs: Option<u64>,
    remote_tool_timeout_secs: Option<u64>,
}

impl SkillflowConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load / Save
    // ========================================================================

    /// 글로벌 + 프로젝트 병합 로드, 이후 환경 변수 적용
    pub fn load() -> Result<Self> {
        let mut config = Self::new();

        if let Ok(global) = JsonStore::global() {
            config.merge_from(&global)?;
        }

        let project = JsonStore::current_project()?;
        config.merge_from(&project)?;

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// 지정한 저장소에서만 로드 (테스트/임베딩용)
    pub fn load_from(store: &JsonStore) -> Result<Self> {
        let mut config = Self::new();
        config.merge_from(store)?;
        Ok(config)
    }

    /// 프로젝트 설정 저장
    pub fn save_project(&self) -> Result<()> {
        let store = JsonStore::current_project()?;
        store.save(SKILLFLOW_CONFIG_FILE, self)
    }

    fn merge_from(&mut self, store: &JsonStore) -> Result<()> {
        if let Some(partial) = store.load_optional::<PartialConfig>(SKILLFLOW_CONFIG_FILE)? {
            self.merge(partial);
        }
        Ok(())
    }

    fn merge(&mut self, other: PartialConfig) {
        self.provider.merge(other.provider);
        if let Some(temperatures) = other.temperatures {
            self.temperatures = temperatures;
        }
        if other.skills_dir.is_some() {
            self.skills_dir = other.skills_dir;
        }
        if let Some(ttl) = other.catalog_ttl_ms {
            self.catalog_ttl_ms = ttl;
        }
        if let Some(secs) = other.completion_timeout_secs {
            self.completion_timeout_secs = secs;
        }
        if let Some(secs) = other.remote_tool_timeout_secs {
            self.remote_tool_timeout_secs = secs;
        }
    }

    /// 환경 변수 오버라이드
    ///
    /// `SKILLFLOW_API_KEY` wins over `OPENAI_API_KEY`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_API_KEY).or_else(|| lookup(ENV_OPENAI_API_KEY)) {
            self.provider.api_key = Some(key);
        }
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.provider.base_url = Some(url);
        }
        if let Some(model) = lookup(ENV_MODEL) {
            self.provider.model = Some(model);
        }
    }

    // ========================================================================
    // Effective values
    // ========================================================================

    pub fn effective_skills_dir(&self) -> PathBuf {
        self.skills_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(".skills"))
    }

    pub fn catalog_ttl(&self) -> Duration {
        Duration::from_millis(self.catalog_ttl_ms)
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_secs(self.completion_timeout_secs)
    }

    pub fn remote_tool_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_tool_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = SkillflowConfig::default();
        assert_eq!(config.catalog_ttl(), Duration::from_millis(5000));
        assert_eq!(config.temperatures.selection, 0.1);
        assert_eq!(config.temperatures.compile, 0.3);
        assert_eq!(config.effective_skills_dir(), PathBuf::from(".skills"));
        assert_eq!(config.provider.effective_model(), DEFAULT_MODEL);
    }

    #[test]
    fn test_partial_file_merges_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(SKILLFLOW_CONFIG_FILE),
            r#"{"provider": {"model": "qwen3"}, "catalogTtlMs": 100}"#,
        )
        .unwrap();

        let config = SkillflowConfig::load_from(&JsonStore::new(dir.path())).unwrap();
        assert_eq!(config.provider.effective_model(), "qwen3");
        assert_eq!(config.catalog_ttl_ms, 100);
        assert_eq!(config.completion_timeout_secs, 120);
        assert_eq!(config.temperatures, TemperatureSettings::default());
    }

    #[test]
    fn test_env_override_precedence() {
        let env: HashMap<&str, &str> = [
            (ENV_OPENAI_API_KEY, "sk-openai"),
            (ENV_API_KEY, "sk-skillflow"),
            (ENV_MODEL, "deepseek-r1"),
        ]
        .into_iter()
        .collect();

        let mut config = SkillflowConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.provider.api_key.as_deref(), Some("sk-skillflow"));
        assert_eq!(config.provider.model.as_deref(), Some("deepseek-r1"));
        assert!(config.provider.base_url.is_none());
    }
}
