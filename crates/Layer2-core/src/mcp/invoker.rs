//! Remote tool invocation boundary
//!
//! 서비스 태스크는 [`RemoteToolInvoker`] 만 알고, MCP 세부사항은
//! [`McpToolInvoker`] 뒤에 숨깁니다.

use super::client::McpClient;
use super::transport::{HttpTransport, McpTransport};
use super::types::McpToolCall;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use skillflow_foundation::{Deadline, Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// 원격 도구 호출 요청
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteToolCall {
    /// 원격 엔드포인트 URL
    pub endpoint: String,

    /// 모델이 추출한 호출 인자
    #[serde(default)]
    pub arguments: Value,

    /// 컨텍스트 + 태스크 이름으로 구성한 지시문
    pub instruction: String,
}

/// Remote tool endpoint client
#[async_trait]
pub trait RemoteToolInvoker: Send + Sync {
    /// Invoke and return the result text
    async fn invoke(&self, call: RemoteToolCall) -> Result<String>;

    /// `invoke` under a deadline
    async fn invoke_within(&self, call: RemoteToolCall, deadline: &Deadline) -> Result<String> {
        deadline.run("remote tool call", self.invoke(call)).await?
    }
}

// ============================================================================
// 인자 해석
// ============================================================================

/// 도구 이름과 인자로 분해된 요청
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRequest {
    /// 명시된 도구 이름 (없으면 서버의 유일한 도구)
    pub tool: Option<String>,
    pub arguments: Value,
}

impl ToolRequest {
    /// 모델이 준 인자 해석
    ///
    /// - object: `tool` 키가 도구 이름, `arguments` 객체가 있으면 그것이 인자,
    ///   없으면 나머지 필드가 인자
    /// - JSON 객체 문자열: 객체와 동일
    /// - 그 외 문자열/값: `{"input": value}`
    pub fn from_arguments(arguments: &Value) -> Self {
        match arguments {
            Value::Null => Self {
                tool: None,
                arguments: Value::Object(Map::new()),
            },
            Value::Object(obj) => Self::from_object(obj),
            Value::String(text) => match serde_json::from_str::<Value>(text) {
                Ok(Value::Object(obj)) => Self::from_object(&obj),
                _ if text.trim().is_empty() => Self::from_arguments(&Value::Null),
                _ => Self {
                    tool: None,
                    arguments: json!({ "input": text }),
                },
            },
            other => Self {
                tool: None,
                arguments: json!({ "input": other }),
            },
        }
    }

    fn from_object(obj: &Map<String, Value>) -> Self {
        let tool = obj
            .get("tool")
            .and_then(Value::as_str)
            .map(str::to_string)
            .filter(|t| !t.is_empty());

        let arguments = match obj.get("arguments") {
            Some(Value::Object(args)) => Value::Object(args.clone()),
            _ => {
                let mut rest = obj.clone();
                rest.remove("tool");
                Value::Object(rest)
            }
        };

        Self { tool, arguments }
    }
}

// ============================================================================
// McpToolInvoker
// ============================================================================

/// MCP streamable-HTTP 엔드포인트 호출기
///
/// 호출마다 새 세션을 열고 닫습니다.
pub struct McpToolInvoker {
    http: reqwest::Client,
}

impl McpToolInvoker {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { http })
    }

    /// 이미 연결된 클라이언트로 호출
    pub async fn call_with(client: &McpClient, call: &RemoteToolCall) -> Result<String> {
        let request = ToolRequest::from_arguments(&call.arguments);
        let tool = match request.tool {
            Some(tool) => tool,
            None => client.sole_tool()?,
        };
        debug!("Resolved MCP tool '{}' on {}", tool, client.name());

        let result = client
            .call_tool(
                &McpToolCall {
                    name: tool.clone(),
                    arguments: request.arguments,
                },
                Some(json!({ "instruction": call.instruction })),
            )
            .await?;

        if result.is_error {
            return Err(Error::Mcp(format!(
                "tool '{}' failed: {}",
                tool,
                result.text()
            )));
        }
        Ok(result.text())
    }
}

#[async_trait]
impl RemoteToolInvoker for McpToolInvoker {
    async fn invoke(&self, call: RemoteToolCall) -> Result<String> {
        if call.endpoint.trim().is_empty() {
            return Err(Error::InvalidInput("Remote tool endpoint is empty".into()));
        }

        info!("Invoking remote tool at {}", call.endpoint);
        let transport: Arc<dyn McpTransport> =
            Arc::new(HttpTransport::new(self.http.clone(), call.endpoint.clone()));
        let client = McpClient::connect(call.endpoint.clone(), transport).await?;

        let result = Self::call_with(&client, &call).await;
        let _ = client.close().await;
        result
    }
}
