//! skillflow-core: Skill catalog and remote tools for Skillflow
//!
//! Layer2 - 외부 협력자 레이어
//!
//! # 주요 모듈
//!
//! - `skill`: 디렉토리 기반 Skill 카탈로그 (SKILL.md, TTL 캐시)
//! - `mcp`: MCP (Model Context Protocol) 원격 도구 호출
//!
//! # 사용 예시
//!
//! ```ignore
//! use skillflow_core::{DirectoryCatalog, SkillCatalog};
//!
//! let catalog = DirectoryCatalog::from_config(&config);
//! let skills = catalog.list_skills().await?;
//!
//! let invoker = McpToolInvoker::new()?;
//! let text = invoker.invoke(RemoteToolCall {
//!     endpoint: "http://localhost:8080/mcp".into(),
//!     arguments: json!({"tool": "lookup", "order": "1234"}),
//!     instruction: "look up the order".into(),
//! }).await?;
//! ```

pub mod mcp;
pub mod skill;

// Re-exports: Skill
pub use skill::{DirectoryCatalog, SkillCatalog, SkillDescriptor};

// Re-exports: MCP
pub use mcp::{McpClient, McpToolInvoker, RemoteToolCall, RemoteToolInvoker};
