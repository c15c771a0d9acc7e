//! MCP Client - 서버 핸드셰이크, 도구 목록, 도구 호출

use super::transport::McpTransport;
use super::types::{McpTool, McpToolCall, McpToolResult};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use skillflow_foundation::{Error, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// MCP 프로토콜 버전
const MCP_PROTOCOL_VERSION: &str = "2025-03-26";

/// MCP 클라이언트 정보
#[derive(Debug, Clone, Serialize)]
struct ClientInfo {
    name: String,
    version: String,
}

/// MCP 서버 정보
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
}

/// Initialize 응답
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitializeResult {
    #[serde(default)]
    protocol_version: String,
    #[serde(default)]
    server_info: ServerInfo,
}

/// MCP 클라이언트
pub struct McpClient {
    /// 서버 이름 (로그용)
    name: String,

    /// 전송 계층
    transport: Arc<dyn McpTransport>,

    /// 사용 가능한 도구들
    tools: RwLock<Vec<McpTool>>,

    /// 서버 정보
    server_info: RwLock<Option<ServerInfo>>,
}

impl McpClient {
    /// 새 클라이언트 생성 (핸드셰이크 전)
    pub fn new(name: impl Into<String>, transport: Arc<dyn McpTransport>) -> Self {
        Self {
            name: name.into(),
            transport,
            tools: RwLock::new(Vec::new()),
            server_info: RwLock::new(None),
        }
    }

    /// 생성 + initialize + tools/list
    pub async fn connect(name: impl Into<String>, transport: Arc<dyn McpTransport>) -> Result<Self> {
        let client = Self::new(name, transport);
        client.initialize().await?;
        client.refresh_tools().await?;
        Ok(client)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn server_info(&self) -> Option<ServerInfo> {
        self.server_info.read().clone()
    }

    /// MCP initialize 핸드셰이크
    pub async fn initialize(&self) -> Result<()> {
        let params = json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "clientInfo": ClientInfo {
                name: "Skillflow".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            "capabilities": {}
        });

        let result = self.transport.request("initialize", Some(params)).await?;

        let init_result: InitializeResult = serde_json::from_value(result)
            .map_err(|e| Error::Mcp(format!("Invalid initialize response: {}", e)))?;

        debug!(
            "MCP server '{}' v{} initialized (protocol: {})",
            init_result.server_info.name,
            init_result.server_info.version,
            init_result.protocol_version
        );
        *self.server_info.write() = Some(init_result.server_info);

        // initialized 알림 전송
        self.transport
            .notify("notifications/initialized", None)
            .await?;

        info!("Connected to MCP server: {}", self.name);
        Ok(())
    }

    /// 도구 목록 새로고침
    pub async fn refresh_tools(&self) -> Result<()> {
        let result = self.transport.request("tools/list", None).await?;

        #[derive(Deserialize)]
        struct ToolsListResult {
            #[serde(default)]
            tools: Vec<McpTool>,
        }

        let tools_result: ToolsListResult = serde_json::from_value(result)
            .map_err(|e| Error::Mcp(format!("Invalid tools/list response: {}", e)))?;

        debug!(
            "Refreshed {} tools from MCP server '{}'",
            tools_result.tools.len(),
            self.name
        );
        *self.tools.write() = tools_result.tools;

        Ok(())
    }

    /// 사용 가능한 도구 목록
    pub fn tools(&self) -> Vec<McpTool> {
        self.tools.read().clone()
    }

    /// 특정 도구 조회
    pub fn get_tool(&self, name: &str) -> Option<McpTool> {
        self.tools.read().iter().find(|t| t.name == name).cloned()
    }

    /// 서버가 제공하는 유일한 도구 이름
    pub fn sole_tool(&self) -> Result<String> {
        let tools = self.tools.read();
        match tools.as_slice() {
            [tool] => Ok(tool.name.clone()),
            [] => Err(Error::Mcp(format!("MCP server '{}' lists no tools", self.name))),
            many => Err(Error::Mcp(format!(
                "MCP server '{}' lists {} tools; the call must name one",
                self.name,
                many.len()
            ))),
        }
    }

    /// 도구 호출
    ///
    /// `meta` is sent as `params._meta`.
    pub async fn call_tool(&self, call: &McpToolCall, meta: Option<Value>) -> Result<McpToolResult> {
        debug!(
            "Calling MCP tool: {} with args: {:?}",
            call.name, call.arguments
        );

        let mut params = json!({
            "name": call.name,
            "arguments": call.arguments
        });
        if let (Some(meta), Some(obj)) = (meta, params.as_object_mut()) {
            obj.insert("_meta".to_string(), meta);
        }

        let result = self.transport.request("tools/call", Some(params)).await?;

        let tool_result: McpToolResult = serde_json::from_value(result)
            .map_err(|e| Error::Mcp(format!("Invalid tools/call response: {}", e)))?;

        if tool_result.is_error {
            warn!(
                "MCP tool '{}' returned error: {}",
                call.name,
                tool_result.text()
            );
        }

        Ok(tool_result)
    }

    /// 연결 종료
    pub async fn close(&self) -> Result<()> {
        self.transport.close().await
    }
}
