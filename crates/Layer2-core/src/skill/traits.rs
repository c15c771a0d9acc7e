//! Skill catalog boundary

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use skillflow_foundation::Result;
use std::path::{Path, PathBuf};

/// 카탈로그 스캔 결과 한 항목
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillDescriptor {
    /// 고유 이름
    pub name: String,

    pub description: String,

    /// Skill 디렉토리
    pub location: PathBuf,
}

/// Skill catalog consumed by the selector and the execute flow
#[async_trait]
pub trait SkillCatalog: Send + Sync {
    /// Ordered listing (name + description + location)
    async fn list_skills(&self) -> Result<Vec<SkillDescriptor>>;

    /// Skill body with the frontmatter removed
    async fn read_skill_body(&self, location: &Path) -> Result<String>;

    /// Exact-name lookup
    async fn find_skill(&self, name: &str) -> Result<Option<SkillDescriptor>> {
        Ok(self
            .list_skills()
            .await?
            .into_iter()
            .find(|skill| skill.name == name))
    }
}
