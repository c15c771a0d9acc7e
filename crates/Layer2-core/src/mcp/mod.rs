//! MCP - Model Context Protocol 원격 도구 호출
//!
//! ## 기능
//! - JSON-RPC 2.0 over HTTP (streamable HTTP, JSON / SSE 응답)
//! - initialize 핸드셰이크, 도구 목록, 도구 호출
//! - 서비스 태스크용 [`RemoteToolInvoker`] 경계
//!
//! ## 참고
//! - https://modelcontextprotocol.io/

mod client;
mod invoker;
mod transport;
mod types;

pub use client::{McpClient, ServerInfo};
pub use invoker::{McpToolInvoker, RemoteToolCall, RemoteToolInvoker, ToolRequest};
pub use transport::{
    parse_event_stream, HttpTransport, JsonRpcError, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, McpTransport,
};
pub use types::{McpContent, McpTool, McpToolCall, McpToolResult};
