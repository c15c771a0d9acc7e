//! MCP Types - MCP 관련 타입 정의

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// MCP 서버에서 제공하는 도구 정보
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpTool {
    /// 도구 이름
    pub name: String,

    /// 도구 설명
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// 입력 스키마 (JSON Schema)
    #[serde(rename = "inputSchema", default)]
    pub input_schema: Value,
}

/// MCP 도구 호출
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpToolCall {
    /// 도구 이름
    pub name: String,

    /// 인자
    #[serde(default)]
    pub arguments: Value,
}

/// MCP 도구 실행 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpToolResult {
    /// 실패 여부
    #[serde(rename = "isError", default)]
    pub is_error: bool,

    /// 결과 콘텐츠
    #[serde(default)]
    pub content: Vec<McpContent>,
}

/// MCP 콘텐츠
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum McpContent {
    /// 텍스트 콘텐츠
    Text { text: String },

    /// 이미지 콘텐츠
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },

    /// 임베디드 리소스
    Resource { resource: Value },

    /// 알 수 없는 콘텐츠 타입
    #[serde(other)]
    Other,
}

impl McpToolResult {
    /// 성공 결과 생성
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            is_error: false,
            content: vec![McpContent::Text { text: text.into() }],
        }
    }

    /// 오류 결과 생성
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            content: vec![McpContent::Text { text: text.into() }],
        }
    }

    /// 모든 텍스트 콘텐츠를 이어붙인 결과
    ///
    /// Embedded resources contribute their `text` field when present.
    pub fn text(&self) -> String {
        let mut parts = Vec::new();
        for content in &self.content {
            match content {
                McpContent::Text { text } => parts.push(text.as_str()),
                McpContent::Resource { resource } => {
                    if let Some(text) = resource.get("text").and_then(Value::as_str) {
                        parts.push(text);
                    }
                }
                McpContent::Image { .. } | McpContent::Other => {}
            }
        }
        parts.join("\n")
    }
}
