//! Remote-tool service task resolver
//!
//! 1단계: 모델이 태스크 이름, Skill 본문, 환경 스냅샷에서 `{mcpUrl, mcpArgs,
//! resourcePath}` 를 추출합니다.
//! 2단계: 추출된 엔드포인트를 인자와 지시문(컨텍스트 + 태스크 이름)으로
//! 호출하고 결과 문자열을 바인딩합니다.

use super::{Resolution, ResolveRequest, ServiceResolver};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use skillflow_core::{RemoteToolCall, RemoteToolInvoker};
use skillflow_foundation::{Error, Result};
use skillflow_provider::{parse_envelope, CompletionClient, CompletionRequest, FenceTolerance};
use skillflow_task::ServiceBinding;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const SYSTEM_PROMPT: &str = "You are a task analysis assistant. Extract the information needed \
to call an MCP tool for the given task and answer strictly in the requested JSON format.";

/// Key every remote-tool result is bound under
const OBJECT_KEY: &str = "[object Object]";

/// Phase-1 result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolPlan {
    #[serde(default)]
    pub mcp_url: String,

    #[serde(default)]
    pub mcp_args: Value,

    #[serde(default)]
    pub resource_path: Option<String>,
}

/// Resolves `mcpService` tasks through a [`RemoteToolInvoker`]
pub struct RemoteToolResolver {
    client: Arc<dyn CompletionClient>,
    invoker: Arc<dyn RemoteToolInvoker>,
    temperature: f32,
    call_timeout: Duration,
}

impl RemoteToolResolver {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        invoker: Arc<dyn RemoteToolInvoker>,
        temperature: f32,
        call_timeout: Duration,
    ) -> Self {
        Self {
            client,
            invoker,
            temperature,
            call_timeout,
        }
    }

    fn analysis_prompt(request: &ResolveRequest) -> String {
        format!(
            "Task: {}\n\nSkill:\n{}\n\nVariables:\n{}\n\n\
Find the MCP endpoint and the call arguments this task needs. \
If you need an extra resource, give its path in resourcePath.\n\
Reply strictly in this JSON format and nothing else:\n\
{{\"mcpUrl\": \"\", \"mcpArgs\": {{}}, \"resourcePath\": \"\"}}",
            request.node.label(),
            request.skill_body.trim(),
            request.environment.snapshot_json()
        )
    }

    /// Phase 1: ask the model where and how to call
    async fn plan(&self, request: &ResolveRequest) -> Result<ToolPlan> {
        let activity_id = request.node.id.as_str();
        let completion = CompletionRequest::system_user(
            SYSTEM_PROMPT,
            Self::analysis_prompt(request),
            self.temperature,
        );

        let reply = self
            .client
            .complete_within(completion, &request.deadline)
            .await
            .map_err(|e| match e {
                Error::Cancelled => Error::Cancelled,
                other => Error::service(activity_id, other.to_string()),
            })?;

        let plan: ToolPlan = parse_envelope(&reply, FenceTolerance::SingleFence)
            .map_err(|e| Error::service(activity_id, e.to_string()))?;

        if plan.mcp_url.trim().is_empty() {
            return Err(Error::service(activity_id, "no MCP endpoint in task analysis"));
        }
        debug!("Activity '{}' plan: {} {}", activity_id, plan.mcp_url, plan.mcp_args);
        Ok(plan)
    }
}

#[async_trait]
impl ServiceResolver for RemoteToolResolver {
    fn name(&self) -> &'static str {
        ServiceBinding::RemoteTool.service_name()
    }

    async fn resolve(&self, request: ResolveRequest) -> Result<Resolution> {
        let plan = self.plan(&request).await?;
        let activity_id = request.node.id.as_str();

        if let Some(path) = plan.resource_path.as_deref().filter(|p| !p.trim().is_empty()) {
            info!("Activity '{}' asked for resource '{}'", activity_id, path);
        }

        let call = RemoteToolCall {
            endpoint: plan.mcp_url.trim().to_string(),
            arguments: plan.mcp_args,
            instruction: format!(
                "context: {}\n{}",
                request.environment.snapshot_json(),
                request.node.label()
            ),
        };
        let deadline = request.deadline.with_timeout(self.call_timeout);

        let text = self
            .invoker
            .invoke_within(call, &deadline)
            .await
            .map_err(|e| match e {
                Error::Cancelled => Error::Cancelled,
                other => Error::service(activity_id, other.to_string()),
            })?;
        info!("Activity '{}' remote tool returned {} chars", activity_id, text.len());

        // Known issue: every result lands on the same stringified-object key,
        // not `output.name`, so later remote-tool results overwrite earlier ones.
        // Kept until the binding rule is signed off.
        let resolution = match &request.descriptor {
            Some(_) => Resolution::bind(OBJECT_KEY, text),
            None => Resolution::unbound(&Value::String(text)),
        };

        Ok(resolution.with_resource_path(plan.resource_path))
    }
}
