//! Language-model service task resolver

use super::{Resolution, ResolveRequest, ServiceResolver};
use crate::descriptor::VariableType;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use skillflow_foundation::{Error, Result};
use skillflow_provider::{parse_envelope, CompletionClient, CompletionRequest, FenceTolerance};
use skillflow_task::ServiceBinding;
use std::sync::Arc;
use tracing::{debug, info, warn};

const SYSTEM_PROMPT: &str = "You are a professional task execution assistant. \
Carry out the requested step of the skill and answer strictly in the requested JSON format.";

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    output: Value,

    #[serde(default, rename = "resourcePath")]
    resource_path: Option<String>,
}

/// Resolves `llmService` tasks with one completion call
pub struct LlmResolver {
    client: Arc<dyn CompletionClient>,
    temperature: f32,
}

impl LlmResolver {
    pub fn new(client: Arc<dyn CompletionClient>, temperature: f32) -> Self {
        Self {
            client,
            temperature,
        }
    }

    fn build_prompt(request: &ResolveRequest) -> String {
        let mut prompt = format!("Skill:\n{}\n", request.skill_body.trim());

        let context = request.descriptor.as_ref().and_then(|d| {
            let name = d.input.non_empty_name()?;
            let value = request.environment.render(name)?;
            Some((name, value))
        });
        if let Some((name, value)) = context {
            prompt.push_str(&format!("\nContext ({}):\n{}\n", name, value));
        }

        let (task, output_type) = match &request.descriptor {
            Some(d) if !d.prompt.trim().is_empty() => (d.prompt.as_str(), d.output.var_type.clone()),
            Some(d) => (request.node.label(), d.output.var_type.clone()),
            None => (request.node.label(), VariableType::Text),
        };

        prompt.push_str(&format!(
            "\nBased on the skill content and the context, {}. The result type is {}. \
If you need an extra resource to finish, give its path in resourcePath.\n\
Reply strictly in this JSON format and nothing else:\n{{\"output\": <result>, \"resourcePath\": \"\"}}",
            task.trim(),
            output_type
        ));
        prompt
    }
}

/// Envelope output as a variable value; null becomes ""
fn output_value(output: Value) -> Value {
    match output {
        Value::Null => Value::String(String::new()),
        other => other,
    }
}

#[async_trait]
impl ServiceResolver for LlmResolver {
    fn name(&self) -> &'static str {
        ServiceBinding::Llm.service_name()
    }

    async fn resolve(&self, request: ResolveRequest) -> Result<Resolution> {
        let activity_id = request.node.id.clone();
        let completion = CompletionRequest::system_user(
            SYSTEM_PROMPT,
            Self::build_prompt(&request),
            self.temperature,
        );

        let reply = self
            .client
            .complete_within(completion, &request.deadline)
            .await
            .map_err(|e| match e {
                Error::Cancelled => Error::Cancelled,
                other => Error::service(activity_id.as_str(), other.to_string()),
            })?;

        let (value, resource_path) =
            match parse_envelope::<Envelope>(&reply, FenceTolerance::SingleFence) {
                Ok(envelope) => (output_value(envelope.output), envelope.resource_path),
                Err(e) => {
                    warn!("Activity '{}': {}; writing empty output", activity_id, e);
                    (Value::String(String::new()), None)
                }
            };

        if let Some(path) = resource_path.as_deref().filter(|p| !p.trim().is_empty()) {
            info!("Activity '{}' asked for resource '{}'", activity_id, path);
        }

        let output = request
            .descriptor
            .as_ref()
            .and_then(|d| d.output.non_empty_name());
        let resolution = match output {
            Some(name) => Resolution::bind(name, value),
            None => {
                debug!("Activity '{}' declares no output; result dropped", activity_id);
                Resolution::unbound(&value)
            }
        };

        Ok(resolution.with_resource_path(resource_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{TaskDescriptor, VariableRef};
    use crate::environment::VariableEnvironment;
    use serde_json::json;
    use skillflow_foundation::Deadline;
    use skillflow_provider::{ProviderError, ScriptedClient};
    use skillflow_task::{ActivityKind, ActivityNode};
    use std::time::Duration;

    fn request(descriptor: Option<TaskDescriptor>, env: VariableEnvironment) -> ResolveRequest {
        ResolveRequest {
            node: ActivityNode::new("Task_calc", ActivityKind::ServiceTask)
                .with_name("Calculate")
                .with_binding(ServiceBinding::Llm),
            descriptor,
            skill_body: Arc::from("Answer the question."),
            environment: env,
            deadline: Deadline::after(Duration::from_secs(5)),
        }
    }

    fn descriptor() -> TaskDescriptor {
        TaskDescriptor {
            hint: String::new(),
            prompt: "compute the answer".into(),
            input: VariableRef::new("question", VariableType::Text),
            output: VariableRef::new("answer", VariableType::Number),
        }
    }

    fn resolver(client: &Arc<ScriptedClient>) -> LlmResolver {
        LlmResolver::new(client.clone(), 0.7)
    }

    #[tokio::test]
    async fn test_fenced_envelope_written() {
        let client = Arc::new(ScriptedClient::with_replies([
            "```json\n{\"output\":\"42\",\"resourcePath\":\"\"}\n```",
        ]));
        let resolution = resolver(&client)
            .resolve(request(Some(descriptor()), VariableEnvironment::new()))
            .await
            .unwrap();

        assert_eq!(resolution.binding, Some(("answer".to_string(), json!("42"))));
        assert!(resolution.resource_path.is_none());
    }

    #[tokio::test]
    async fn test_non_json_reply_writes_empty() {
        let client = Arc::new(ScriptedClient::with_replies(["The answer is 42."]));
        let resolution = resolver(&client)
            .resolve(request(Some(descriptor()), VariableEnvironment::new()))
            .await
            .unwrap();

        assert_eq!(resolution.binding, Some(("answer".to_string(), json!(""))));
    }

    #[tokio::test]
    async fn test_prompt_includes_context_when_present() {
        let client = Arc::new(ScriptedClient::with_replies([r#"{"output": 1}"#]));
        let mut env = VariableEnvironment::new();
        env.set("question", "what is 6 x 7").unwrap();

        resolver(&client)
            .resolve(request(Some(descriptor()), env))
            .await
            .unwrap();

        let requests = client.requests();
        let sent = &requests[0];
        let prompt = sent.user_prompt().unwrap();
        assert_eq!(sent.temperature, 0.7);
        assert!(prompt.contains("Answer the question."));
        assert!(prompt.contains("what is 6 x 7"));
        assert!(prompt.contains("compute the answer"));
        assert!(prompt.contains("number"));
    }

    #[tokio::test]
    async fn test_prompt_omits_missing_context() {
        let client = Arc::new(ScriptedClient::with_replies([r#"{"output": 1}"#]));
        resolver(&client)
            .resolve(request(Some(descriptor()), VariableEnvironment::new()))
            .await
            .unwrap();

        assert!(!client.requests()[0].user_prompt().map(str::to_string).unwrap().contains("Context"));
    }

    #[tokio::test]
    async fn test_without_descriptor_nothing_bound() {
        let client = Arc::new(ScriptedClient::with_replies([r#"{"output": "ok", "resourcePath": "a.md"}"#]));
        let resolution = resolver(&client)
            .resolve(request(None, VariableEnvironment::new()))
            .await
            .unwrap();

        assert!(resolution.binding.is_none());
        assert_eq!(resolution.result_text, "ok");
        assert_eq!(resolution.resource_path.as_deref(), Some("a.md"));
        assert!(client.requests()[0].user_prompt().map(str::to_string).unwrap().contains("Calculate"));
    }

    #[tokio::test]
    async fn test_null_output_writes_empty() {
        let client = Arc::new(ScriptedClient::with_replies([r#"{"output": null}"#]));
        let resolution = resolver(&client)
            .resolve(request(Some(descriptor()), VariableEnvironment::new()))
            .await
            .unwrap();
        assert_eq!(resolution.binding, Some(("answer".to_string(), json!(""))));
    }

    #[tokio::test]
    async fn test_completion_error_fails_task() {
        let client = Arc::new(ScriptedClient::new());
        client.push_error(ProviderError::RateLimited("slow down".into()));

        let err = resolver(&client)
            .resolve(request(Some(descriptor()), VariableEnvironment::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ServiceResolution { ref activity_id, .. } if activity_id == "Task_calc"));
    }
}
