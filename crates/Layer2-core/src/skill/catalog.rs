//! Directory Catalog - `.skills/<dir>/SKILL.md` 기반 카탈로그
//!
//! 스캔 결과는 TTL 동안 캐시됩니다. 디렉토리가 없거나 읽을 수 없으면
//! 빈 목록으로 대체하고, 그 결과도 일반 스캔처럼 캐시합니다.

use super::loader::{render_skill_file, SkillFile, INSTRUCTIONS_FILE, SKILL_FILE};
use super::traits::{SkillCatalog, SkillDescriptor};
use async_trait::async_trait;
use parking_lot::Mutex;
use skillflow_foundation::{Error, Result, SkillflowConfig};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

struct CachedListing {
    scanned_at: Instant,
    skills: Vec<SkillDescriptor>,
}

/// 디렉토리 기반 Skill 카탈로그
pub struct DirectoryCatalog {
    root: PathBuf,
    ttl: Duration,
    cache: Mutex<Option<CachedListing>>,
}

impl DirectoryCatalog {
    pub fn new(root: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            root: root.into(),
            ttl,
            cache: Mutex::new(None),
        }
    }

    /// 설정에서 생성 (skillsDir, catalogTtlMs)
    pub fn from_config(config: &SkillflowConfig) -> Self {
        Self::new(config.effective_skills_dir(), config.catalog_ttl())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 캐시를 고려한 목록
    pub fn list(&self) -> Vec<SkillDescriptor> {
        let mut cache = self.cache.lock();
        if let Some(cached) = cache.as_ref() {
            if cached.scanned_at.elapsed() < self.ttl {
                return cached.skills.clone();
            }
        }

        let skills = self.scan();
        *cache = Some(CachedListing {
            scanned_at: Instant::now(),
            skills: skills.clone(),
        });
        skills
    }

    /// 캐시 무효화
    pub fn clear_cache(&self) {
        *self.cache.lock() = None;
    }

    /// 이름으로 정확히 일치하는 Skill
    pub fn select_skill(&self, name: &str) -> Option<SkillDescriptor> {
        self.list().into_iter().find(|skill| skill.name == name)
    }

    /// 새 Skill 디렉토리와 SKILL.md 생성
    pub fn add_skill(
        &self,
        dir_name: &str,
        name: &str,
        description: &str,
        body: &str,
    ) -> Result<SkillDescriptor> {
        if dir_name.trim().is_empty()
            || dir_name.contains(&['/', '\\'][..])
            || dir_name == "."
            || dir_name == ".."
        {
            return Err(Error::InvalidInput(format!(
                "Invalid skill directory name: '{}'",
                dir_name
            )));
        }
        if name.trim().is_empty() || description.trim().is_empty() {
            return Err(Error::InvalidInput(
                "Skill name and description are required".into(),
            ));
        }

        let location = self.root.join(dir_name);
        let skill_file = location.join(SKILL_FILE);
        if skill_file.exists() {
            return Err(Error::InvalidInput(format!(
                "Skill already exists: {}",
                skill_file.display()
            )));
        }

        std::fs::create_dir_all(&location)?;
        std::fs::write(&skill_file, render_skill_file(name, description, body))?;
        self.clear_cache();

        info!("Added skill '{}' at {}", name, location.display());

        Ok(SkillDescriptor {
            name: name.to_string(),
            description: description.to_string(),
            location,
        })
    }

    /// INSTRUCTIONS.md가 있으면 그 내용, 없으면 SKILL.md 본문
    pub fn load_full_instructions(&self, skill: &SkillDescriptor) -> Result<String> {
        let instructions = skill.location.join(INSTRUCTIONS_FILE);
        if instructions.is_file() {
            debug!("Loading full instructions from {}", instructions.display());
            return std::fs::read_to_string(&instructions).map_err(|e| {
                Error::CatalogUnavailable(format!("{}: {}", instructions.display(), e))
            });
        }

        self.read_body(&skill.location)
    }

    fn read_body(&self, location: &Path) -> Result<String> {
        SkillFile::from_dir(location)
            .map(|file| file.body)
            .map_err(|e| Error::CatalogUnavailable(format!("{}: {}", location.display(), e)))
    }

    /// 디렉토리 스캔 (캐시 없음)
    fn scan(&self) -> Vec<SkillDescriptor> {
        if !self.root.is_dir() {
            info!("Skill directory not found: {}", self.root.display());
            return Vec::new();
        }

        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                error!("Failed to read skill directory {}: {}", self.root.display(), e);
                return Vec::new();
            }
        };

        let mut dirs: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        dirs.sort();

        let mut skills = Vec::new();
        for dir in dirs {
            if let Some(skill) = Self::read_descriptor(&dir) {
                skills.push(skill);
            }
        }

        info!("Found {} skills in {}", skills.len(), self.root.display());
        skills
    }

    fn read_descriptor(dir: &Path) -> Option<SkillDescriptor> {
        if !dir.join(SKILL_FILE).is_file() {
            warn!("Skill {} has no {}", dir.display(), SKILL_FILE);
            return None;
        }

        let file = match SkillFile::from_dir(dir) {
            Ok(file) => file,
            Err(e) => {
                warn!("Failed to load skill from {}: {}", dir.display(), e);
                return None;
            }
        };

        let Some(name) = file.frontmatter.name() else {
            warn!("Skill {} has no name", dir.display());
            return None;
        };
        let Some(description) = file.frontmatter.description() else {
            warn!("Skill {} has no description", dir.display());
            return None;
        };

        Some(SkillDescriptor {
            name: name.to_string(),
            description: description.to_string(),
            location: dir.to_path_buf(),
        })
    }
}

#[async_trait]
impl SkillCatalog for DirectoryCatalog {
    async fn list_skills(&self) -> Result<Vec<SkillDescriptor>> {
        Ok(self.list())
    }

    async fn read_skill_body(&self, location: &Path) -> Result<String> {
        self.read_body(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_skill(root: &Path, dir: &str, content: &str) {
        let path = root.join(dir);
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(path.join(SKILL_FILE), content).unwrap();
    }

    fn catalog(root: &Path) -> DirectoryCatalog {
        DirectoryCatalog::new(root, Duration::from_secs(5))
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let temp = TempDir::new().unwrap();
        let catalog = catalog(&temp.path().join("nope"));
        assert!(catalog.list().is_empty());
    }

    #[test]
    fn test_scan_skips_incomplete_entries() {
        let temp = TempDir::new().unwrap();
        write_skill(
            temp.path(),
            "b-refund",
            "---\nname: refund\ndescription: handles refund requests\n---\nRefund steps",
        );
        write_skill(temp.path(), "a-nameless", "---\ndescription: no name\n---\nbody");
        write_skill(temp.path(), "c-nodesc", "---\nname: nodesc\n---\nbody");
        std::fs::create_dir_all(temp.path().join("d-empty")).unwrap();

        let skills = catalog(temp.path()).list();
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].name, "refund");
        assert_eq!(skills[0].location, temp.path().join("b-refund"));
    }

    #[test]
    fn test_listing_is_ordered_by_directory() {
        let temp = TempDir::new().unwrap();
        write_skill(temp.path(), "zeta", "---\nname: z\ndescription: last\n---\n");
        write_skill(temp.path(), "alpha", "---\nname: a\ndescription: first\n---\n");

        let names: Vec<_> = catalog(temp.path())
            .list()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["a", "z"]);
    }

    #[test]
    fn test_cache_until_cleared() {
        let temp = TempDir::new().unwrap();
        let catalog = catalog(temp.path());
        assert!(catalog.list().is_empty());

        write_skill(temp.path(), "late", "---\nname: late\ndescription: added later\n---\n");
        assert!(catalog.list().is_empty());

        catalog.clear_cache();
        assert_eq!(catalog.list().len(), 1);
    }

    #[test]
    fn test_cache_expires() {
        let temp = TempDir::new().unwrap();
        let catalog = DirectoryCatalog::new(temp.path(), Duration::ZERO);
        assert!(catalog.list().is_empty());

        write_skill(temp.path(), "late", "---\nname: late\ndescription: added later\n---\n");
        assert_eq!(catalog.list().len(), 1);
    }

    #[test]
    fn test_add_and_select_skill() {
        let temp = TempDir::new().unwrap();
        let catalog = catalog(temp.path());
        assert!(catalog.select_skill("greet").is_none());

        let added = catalog
            .add_skill("greet", "greet", "says hello", "Say hello to the user.")
            .unwrap();
        let selected = catalog.select_skill("greet").unwrap();

        assert_eq!(added, selected);
        assert!(catalog.add_skill("greet", "greet", "dup", "x").is_err());
        assert!(catalog.add_skill("../escape", "x", "y", "z").is_err());
    }

    #[test]
    fn test_full_instructions_prefers_instructions_file() {
        let temp = TempDir::new().unwrap();
        let catalog = catalog(temp.path());
        let skill = catalog
            .add_skill("report", "report", "writes reports", "Short body")
            .unwrap();

        assert_eq!(catalog.load_full_instructions(&skill).unwrap(), "Short body");

        std::fs::write(skill.location.join(INSTRUCTIONS_FILE), "Full instructions").unwrap();
        assert_eq!(
            catalog.load_full_instructions(&skill).unwrap(),
            "Full instructions"
        );
    }

    #[tokio::test]
    async fn test_read_skill_body() {
        let temp = TempDir::new().unwrap();
        write_skill(
            temp.path(),
            "refund",
            "---\nname: refund\ndescription: d\n---\n\n  Refund steps  \n",
        );
        let catalog = catalog(temp.path());

        let body = catalog
            .read_skill_body(&temp.path().join("refund"))
            .await
            .unwrap();
        assert_eq!(body, "Refund steps");

        let missing = catalog.read_skill_body(&temp.path().join("none")).await;
        assert!(matches!(missing, Err(Error::CatalogUnavailable(_))));
    }

    #[tokio::test]
    async fn test_find_skill_through_trait() {
        let temp = TempDir::new().unwrap();
        write_skill(temp.path(), "refund", "---\nname: refund\ndescription: d\n---\n");
        let catalog: Box<dyn SkillCatalog> = Box::new(catalog(temp.path()));

        assert!(catalog.find_skill("refund").await.unwrap().is_some());
        assert!(catalog.find_skill("Refund").await.unwrap().is_none());
    }
}
