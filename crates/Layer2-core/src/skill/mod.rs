//! # Skill Catalog
//!
//! 디렉토리 기반 Skill 카탈로그
//!
//! ## 구조
//!
//! ```text
//! .skills/
//! ├── refund/
//! │   ├── SKILL.md          (---\nname, description\n--- + 본문)
//! │   └── INSTRUCTIONS.md   (선택: 전체 지침)
//! └── translate/
//!     └── SKILL.md
//! ```
//!
//! ## 예시
//!
//! ```ignore
//! let catalog = DirectoryCatalog::from_config(&config);
//! for skill in catalog.list_skills().await? {
//!     println!("{}: {}", skill.name, skill.description);
//! }
//! let body = catalog.read_skill_body(&skill.location).await?;
//! ```

mod catalog;
mod loader;
mod traits;

pub use catalog::DirectoryCatalog;
pub use loader::{
    parse_frontmatter, render_skill_file, SkillFile, SkillFrontmatter, INSTRUCTIONS_FILE,
    SKILL_FILE,
};
pub use traits::{SkillCatalog, SkillDescriptor};
