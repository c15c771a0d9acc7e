//! Skill Loader - SKILL.md 파싱
//!
//! `---` 로 구분된 YAML frontmatter(name, description)와 본문을 분리합니다.

use serde::Deserialize;
use skillflow_foundation::{Error, Result};
use std::path::{Path, PathBuf};

/// Skill 정의 파일명
pub const SKILL_FILE: &str = "SKILL.md";

/// 전체 지침 파일명 (선택)
pub const INSTRUCTIONS_FILE: &str = "INSTRUCTIONS.md";

// ============================================================================
// SkillFrontmatter - YAML frontmatter에서 파싱된 설정
// ============================================================================

/// SKILL.md의 YAML frontmatter
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SkillFrontmatter {
    /// Skill 이름 (카탈로그 내 고유)
    #[serde(default)]
    pub name: Option<String>,

    /// 선택 프롬프트에 노출되는 설명
    #[serde(default)]
    pub description: Option<String>,
}

impl SkillFrontmatter {
    fn non_empty(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn name(&self) -> Option<&str> {
        Self::non_empty(&self.name)
    }

    pub fn description(&self) -> Option<&str> {
        Self::non_empty(&self.description)
    }
}

// ============================================================================
// SkillFile - 파싱된 SKILL.md
// ============================================================================

/// 파싱된 SKILL.md
#[derive(Debug, Clone)]
pub struct SkillFile {
    pub frontmatter: SkillFrontmatter,

    /// frontmatter를 제거한 본문 (trim)
    pub body: String,

    pub source_path: PathBuf,
}

impl SkillFile {
    /// `<dir>/SKILL.md` 로드
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let path = dir.join(SKILL_FILE);
        let content = std::fs::read_to_string(&path)?;
        Self::parse(&content, path)
    }

    /// 문자열에서 파싱
    pub fn parse(content: &str, source_path: PathBuf) -> Result<Self> {
        let (frontmatter, body) = parse_frontmatter(content)?;
        Ok(Self {
            frontmatter,
            body,
            source_path,
        })
    }
}

// ============================================================================
// Frontmatter 파서
// ============================================================================

/// YAML frontmatter와 body를 분리
pub fn parse_frontmatter(content: &str) -> Result<(SkillFrontmatter, String)> {
    let lines: Vec<&str> = content.lines().collect();

    if lines.is_empty() || lines[0].trim() != "---" {
        // frontmatter 없음
        return Ok((SkillFrontmatter::default(), content.trim().to_string()));
    }

    let end_idx = lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, line)| line.trim() == "---")
        .map(|(i, _)| i)
        .ok_or_else(|| Error::InvalidInput("Invalid SKILL.md: unclosed frontmatter".into()))?;

    let yaml_content = lines[1..end_idx].join("\n");
    let frontmatter: SkillFrontmatter = if yaml_content.trim().is_empty() {
        SkillFrontmatter::default()
    } else {
        serde_yaml::from_str(&yaml_content)
            .map_err(|e| Error::InvalidInput(format!("Invalid YAML frontmatter: {}", e)))?
    };

    let body = lines[(end_idx + 1)..].join("\n").trim().to_string();

    Ok((frontmatter, body))
}

/// SKILL.md 내용 생성 (add_skill 용)
pub fn render_skill_file(name: &str, description: &str, body: &str) -> String {
    format!(
        "---\nname: {}\ndescription: {}\n---\n\n{}\n",
        yaml_scalar(name),
        yaml_scalar(description),
        body.trim()
    )
}

fn yaml_scalar(value: &str) -> String {
    // 따옴표로 감싼 JSON 문자열은 유효한 YAML 스칼라
    serde_json::Value::String(value.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_SKILL: &str = r#"---
name: refund
description: handles refund requests
---

1. Ask the customer for the order number
2. Look the order up
3. Issue the refund
"#;

    #[test]
    fn test_parse_frontmatter() {
        let (fm, body) = parse_frontmatter(SAMPLE_SKILL).unwrap();

        assert_eq!(fm.name(), Some("refund"));
        assert_eq!(fm.description(), Some("handles refund requests"));
        assert!(body.starts_with("1. Ask"));
        assert!(!body.contains("---"));
    }

    #[test]
    fn test_no_frontmatter() {
        let content = "Just some instructions without frontmatter.";
        let (fm, body) = parse_frontmatter(content).unwrap();

        assert!(fm.name().is_none());
        assert_eq!(body, content);
    }

    #[test]
    fn test_unclosed_frontmatter() {
        let result = parse_frontmatter("---\nname: x\nbody");
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_blank_fields_treated_as_missing() {
        let (fm, _) = parse_frontmatter("---\nname: \"  \"\ndescription: d\n---\nbody").unwrap();
        assert!(fm.name().is_none());
        assert_eq!(fm.description(), Some("d"));
    }

    #[test]
    fn test_render_roundtrip_with_colon() {
        let text = render_skill_file("translate", "translate: any language", "Do it.");
        let (fm, body) = parse_frontmatter(&text).unwrap();

        assert_eq!(fm.name(), Some("translate"));
        assert_eq!(fm.description(), Some("translate: any language"));
        assert_eq!(body, "Do it.");
    }
}
