//! Process compiler
//!
//! Skill 본문을 BPMN 2.0 프로세스 정의로 변환합니다. 실패는 해당 실행
//! 시도 전체에 치명적이며 재시도하지 않습니다.

use skillflow_foundation::{Deadline, Error, Result};
use skillflow_provider::{strip_fence, CompletionClient, CompletionRequest};
use skillflow_task::ServiceBinding;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

fn system_prompt() -> String {
    format!(
        r#"You are an expert BPMN 2.0 assistant. Convert the skill below into one executable BPMN 2.0 process.

Rules:
1. Use only these task kinds: bpmn:userTask, bpmn:serviceTask, bpmn:scriptTask. Connect them in one straight line with sequenceFlow elements from a single startEvent to a single endEvent. No gateways, no sub-processes.
2. Every task has a name attribute and exactly one bpmn:documentation element.
3. A serviceTask sets implementation="${{environment.services.{llm}}}" when the step needs language-model reasoning, or implementation="${{environment.services.{mcp}}}" when it needs a remote tool call.
4. A userTask is a step that needs an answer from the user.
5. The documentation is one JSON object:
   {{"hint": "<question shown to the user, userTask only>", "prompt": "<what to do, serviceTask only>", "input": {{"name": "<variable>", "type": "text|number|boolean|collection"}}, "output": {{"name": "<variable>", "type": "text|number|boolean|collection"}}}}
6. The user's original request is available in the variable "userInput".
7. Reply with the XML document only, no other content."#,
        llm = ServiceBinding::Llm.service_name(),
        mcp = ServiceBinding::RemoteTool.service_name(),
    )
}

/// Turns a skill body into a process definition
pub struct ProcessCompiler {
    client: Arc<dyn CompletionClient>,
    temperature: f32,
    timeout: Duration,
}

impl ProcessCompiler {
    pub fn new(client: Arc<dyn CompletionClient>, temperature: f32, timeout: Duration) -> Self {
        Self {
            client,
            temperature,
            timeout,
        }
    }

    /// Generate a definition for `skill_body`
    ///
    /// Any failure becomes `Error::CompileFailure`.
    pub async fn compile(&self, skill_body: &str) -> Result<String> {
        let request = CompletionRequest::system_user(
            system_prompt(),
            format!("Skill:\n{}", skill_body.trim()),
            self.temperature,
        );
        let deadline = Deadline::after(self.timeout);

        let reply = self
            .client
            .complete_within(request, &deadline)
            .await
            .map_err(|e| Error::CompileFailure(e.to_string()))?;

        let definition = extract_definition(&reply).ok_or_else(|| {
            Error::CompileFailure("reply does not contain a process definition".to_string())
        })?;

        info!("Process definition generated ({} chars)", definition.len());
        debug!("{}", definition);
        Ok(definition.to_string())
    }
}

/// Cut the XML document out of a model reply
pub fn extract_definition(reply: &str) -> Option<&str> {
    let text = strip_fence(reply);

    let start = text
        .find("<?xml")
        .or_else(|| text.find("<bpmn:definitions"))
        .or_else(|| text.find("<definitions"))?;
    let end = text.rfind('>')?;

    (end > start).then(|| text[start..=end].trim())
}
