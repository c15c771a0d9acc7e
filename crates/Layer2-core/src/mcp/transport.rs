//! MCP Transport - 전송 계층 구현
//!
//! JSON-RPC 2.0 over HTTP POST ("streamable HTTP").
//! 응답 본문은 `application/json` 또는 단일 이벤트 `text/event-stream` 입니다.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use skillflow_foundation::{Error, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// 세션 헤더
const SESSION_HEADER: &str = "Mcp-Session-Id";

/// JSON-RPC 2.0 요청
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC 2.0 응답
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    fn answers(&self, id: u64) -> bool {
        match &self.id {
            Some(Value::Number(n)) => n.as_u64() == Some(id),
            Some(Value::String(s)) => s == &id.to_string(),
            _ => false,
        }
    }

    /// result 또는 error를 Result로 변환
    pub fn into_result(self) -> Result<Value> {
        if let Some(error) = self.error {
            return Err(Error::Mcp(format!("error {}: {}", error.code, error.message)));
        }
        Ok(self.result.unwrap_or(Value::Null))
    }
}

/// JSON-RPC 에러
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// JSON-RPC 알림 (응답 없음)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// MCP Transport trait
#[async_trait]
pub trait McpTransport: Send + Sync {
    /// 요청 전송 및 응답 수신
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value>;

    /// 알림 전송 (응답 없음)
    async fn notify(&self, method: &str, params: Option<Value>) -> Result<()>;

    /// 연결 종료
    async fn close(&self) -> Result<()>;
}

// ============================================================================
// HttpTransport
// ============================================================================

/// HTTP POST 기반 전송
pub struct HttpTransport {
    /// 서버 URL
    url: String,

    /// 요청 ID 카운터
    request_id: AtomicU64,

    /// HTTP 클라이언트
    client: reqwest::Client,

    /// 서버가 발급한 세션 ID
    session_id: Mutex<Option<String>>,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            request_id: AtomicU64::new(1),
            client,
            session_id: Mutex::new(None),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// 다음 요청 ID 생성
    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::SeqCst)
    }

    async fn post<T: Serialize + ?Sized>(&self, body: &T) -> Result<reqwest::Response> {
        let mut builder = self
            .client
            .post(&self.url)
            .header("Accept", "application/json, text/event-stream")
            .json(body);
        let session = self.session_id.lock().clone();
        if let Some(session) = session {
            builder = builder.header(SESSION_HEADER, session);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Http(format!("{}: {}", self.url, e)))?;

        if !response.status().is_success() {
            return Err(Error::Http(format!(
                "{} returned HTTP {}",
                self.url,
                response.status()
            )));
        }

        if let Some(session) = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            *self.session_id.lock() = Some(session.to_string());
        }

        Ok(response)
    }
}

#[async_trait]
impl McpTransport for HttpTransport {
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id();
        let request = JsonRpcRequest::new(id, method, params);
        debug!("MCP request #{} {} -> {}", id, method, self.url);

        let response = self.post(&request).await?;
        let is_event_stream = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("text/event-stream"))
            .unwrap_or(false);

        let body = response
            .text()
            .await
            .map_err(|e| Error::Http(format!("{}: {}", self.url, e)))?;

        let response = if is_event_stream {
            parse_event_stream(&body, id)?
        } else {
            serde_json::from_str::<JsonRpcResponse>(&body)
                .map_err(|e| Error::Mcp(format!("Invalid JSON-RPC response: {}", e)))?
        };

        response.into_result()
    }

    async fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
        let notification = JsonRpcNotification {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
        };
        self.post(&notification).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let session = self.session_id.lock().take();
        let Some(session) = session else {
            return Ok(());
        };

        // 세션 종료 실패는 무시
        if let Err(e) = self
            .client
            .delete(&self.url)
            .header(SESSION_HEADER, session)
            .send()
            .await
        {
            debug!("MCP session close failed: {}", e);
        }
        Ok(())
    }
}

/// SSE 본문에서 요청 ID에 대한 응답 추출
pub fn parse_event_stream(body: &str, id: u64) -> Result<JsonRpcResponse> {
    let mut data = String::new();
    let flush = |data: &mut String| -> Option<JsonRpcResponse> {
        if data.is_empty() {
            return None;
        }
        let parsed = serde_json::from_str::<JsonRpcResponse>(data).ok();
        data.clear();
        parsed.filter(|response| response.answers(id))
    };

    for line in body.lines() {
        if let Some(rest) = line.strip_prefix("data:") {
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(rest.strip_prefix(' ').unwrap_or(rest));
        } else if line.trim().is_empty() {
            if let Some(response) = flush(&mut data) {
                return Ok(response);
            }
        }
    }

    flush(&mut data)
        .ok_or_else(|| Error::Mcp(format!("No response for request #{} in event stream", id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_rpc_request() {
        let request =
            JsonRpcRequest::new(1, "test/method", Some(serde_json::json!({"key": "value"})));
        assert_eq!(request.jsonrpc, "2.0");
        assert_eq!(request.id, 1);
        assert_eq!(request.method, "test/method");
    }

    #[test]
    fn test_error_response() {
        let response: JsonRpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":3,"error":{"code":-32601,"message":"Method not found"}}"#,
        )
        .unwrap();
        assert!(response.answers(3));
        assert!(matches!(response.into_result(), Err(Error::Mcp(msg)) if msg.contains("-32601")));
    }

    #[test]
    fn test_parse_event_stream() {
        let body = "event: message\n\
                    data: {\"jsonrpc\":\"2.0\",\"method\":\"notifications/progress\"}\n\
                    \n\
                    event: message\n\
                    data: {\"jsonrpc\":\"2.0\",\"id\":7,\"result\":{\"ok\":true}}\n\
                    \n";
        let response = parse_event_stream(body, 7).unwrap();
        assert_eq!(response.into_result().unwrap()["ok"], true);
    }

    #[test]
    fn test_parse_event_stream_without_trailing_blank() {
        let body = "data: {\"jsonrpc\":\"2.0\",\"id\":\"2\",\"result\":{}}";
        assert!(parse_event_stream(body, 2).is_ok());
        assert!(parse_event_stream(body, 9).is_err());
    }
}
