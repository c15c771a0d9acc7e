//! End-to-end tests: catalog → selection → compile → instance → feedback → end

use async_trait::async_trait;
use serde_json::json;
use skillflow_core::{DirectoryCatalog, RemoteToolCall, RemoteToolInvoker};
use skillflow_foundation::{Error, Result, SkillEvent, SkillEventKind, SkillflowConfig};
use skillflow_provider::{ProviderError, ScriptedClient};
use skillflow_runtime::{SkillRuntime, FINISHED_LOG};
use skillflow_task::ExecutionState;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::broadcast;

// ============================================================================
// Fixtures
// ============================================================================

struct StubInvoker {
    reply: String,
    calls: Mutex<Vec<RemoteToolCall>>,
}

impl StubInvoker {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl RemoteToolInvoker for StubInvoker {
    async fn invoke(&self, call: RemoteToolCall) -> Result<String> {
        self.calls.lock().unwrap().push(call);
        Ok(self.reply.clone())
    }
}

const REFUND_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<bpmn:definitions xmlns:bpmn="http://www.omg.org/spec/BPMN/20100524/MODEL" id="defs">
  <bpmn:process id="refund" isExecutable="true">
    <bpmn:startEvent id="start"/>
    <bpmn:userTask id="Task_order" name="Ask order number">
      <bpmn:documentation>{"hint": "Which order should be refunded?", "prompt": "", "input": {"name": "userInput", "type": "text"}, "output": {"name": "orderId", "type": "text"}}</bpmn:documentation>
    </bpmn:userTask>
    <bpmn:serviceTask id="Task_status" name="Look up order" implementation="${environment.services.mcpService}">
      <bpmn:documentation>{"hint": "", "prompt": "look up the order status", "input": {"name": "orderId", "type": "text"}, "output": {"name": "orderStatus", "type": "text"}}</bpmn:documentation>
    </bpmn:serviceTask>
    <bpmn:serviceTask id="Task_reply" name="Write reply" implementation="${environment.services.llmService}">
      <bpmn:documentation>{"hint": "", "prompt": "write a reply to the customer", "input": {"name": "orderId", "type": "text"}, "output": {"name": "reply", "type": "text"}}</bpmn:documentation>
    </bpmn:serviceTask>
    <bpmn:endEvent id="end"/>
    <bpmn:sequenceFlow id="f1" sourceRef="start" targetRef="Task_order"/>
    <bpmn:sequenceFlow id="f2" sourceRef="Task_order" targetRef="Task_status"/>
    <bpmn:sequenceFlow id="f3" sourceRef="Task_status" targetRef="Task_reply"/>
    <bpmn:sequenceFlow id="f4" sourceRef="Task_reply" targetRef="end"/>
  </bpmn:process>
</bpmn:definitions>"#;

fn catalog_with_refund(dir: &TempDir) -> Arc<DirectoryCatalog> {
    let catalog = DirectoryCatalog::new(dir.path(), Duration::from_secs(5));
    catalog
        .add_skill(
            "refund",
            "refund",
            "handles refund requests",
            "Ask for the order number, look it up at http://orders/mcp, then reply.",
        )
        .unwrap();
    Arc::new(catalog)
}

fn runtime(
    catalog: Arc<DirectoryCatalog>,
    client: &Arc<ScriptedClient>,
    invoker: &Arc<StubInvoker>,
) -> SkillRuntime {
    SkillRuntime::builder()
        .catalog(catalog)
        .client(client.clone())
        .invoker(invoker.clone())
        .config(SkillflowConfig::default())
        .build()
        .unwrap()
}

async fn next_event(events: &mut broadcast::Receiver<SkillEvent>) -> SkillEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("event in time")
        .unwrap()
}

// ============================================================================
// Selection
// ============================================================================

#[tokio::test]
async fn test_match_refund() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::with_replies(["use skill: refund"]));
    let invoker = StubInvoker::new("unused");
    let runtime = runtime(catalog_with_refund(&dir), &client, &invoker);

    assert_eq!(runtime.match_skills("I want a refund").await, vec!["refund".to_string()]);
}

#[tokio::test]
async fn test_missing_skills_dir_selects_nothing() {
    let dir = TempDir::new().unwrap();
    let catalog = Arc::new(DirectoryCatalog::new(dir.path().join("absent"), Duration::from_secs(5)));
    let client = Arc::new(ScriptedClient::with_replies(["use skill: refund"]));
    let invoker = StubInvoker::new("unused");
    let runtime = runtime(catalog, &client, &invoker);

    assert!(runtime.run("I want a refund").await.unwrap().is_none());
    assert_eq!(client.calls(), 0);
}

// ============================================================================
// Execution
// ============================================================================

#[tokio::test]
async fn test_refund_end_to_end() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::with_replies([
        "use skill: refund".to_string(),
        format!("```xml\n{}\n```", REFUND_XML),
        r#"{"mcpUrl": "http://orders/mcp", "mcpArgs": {"tool": "status"}, "resourcePath": ""}"#.to_string(),
        "```json\n{\"output\": \"Your refund is on its way\", \"resourcePath\": \"\"}\n```".to_string(),
    ]));
    let invoker = StubInvoker::new("shipped");
    let runtime = runtime(catalog_with_refund(&dir), &client, &invoker);

    let mut instance = runtime.run("I want a refund").await.unwrap().unwrap();
    let mut events = instance.subscribe();

    let task = loop {
        if let SkillEventKind::HumanTask(task) = next_event(&mut events).await.kind {
            break task;
        }
    };
    assert_eq!(task.activity_id, "Task_order");
    assert_eq!(task.hint, "Which order should be refunded?");
    assert_eq!(task.current_input_text, "I want a refund");

    instance.feedback("Task_order", "A-1001").await.unwrap();

    let mut logs = Vec::new();
    let finished = loop {
        let event = next_event(&mut events).await;
        match event.kind {
            SkillEventKind::Log { text } => logs.push(text),
            SkillEventKind::Finished { error } => break error,
            SkillEventKind::HumanTask(task) => panic!("unexpected human task {:?}", task),
        }
    };
    assert_eq!(finished, None);
    assert_eq!(
        logs,
        vec![
            "activity finished: Ask order number".to_string(),
            "activity finished: Look up order".to_string(),
            "activity finished: Write reply".to_string(),
            FINISHED_LOG.to_string(),
        ]
    );

    let summary = instance.wait().await.unwrap();
    assert_eq!(summary.state, ExecutionState::Completed);
    assert_eq!(summary.completed.len(), 5);

    let calls = invoker.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].endpoint, "http://orders/mcp");
    assert_eq!(calls[0].arguments, json!({"tool": "status"}));
    assert!(calls[0].instruction.contains("\"orderId\":\"A-1001\""));

    // LLM resolver sees the human answer as its context
    let requests = client.requests();
    assert_eq!(requests.len(), 4);
    let reply_prompt = requests[3].user_prompt().unwrap();
    assert!(reply_prompt.contains("A-1001"));
    assert!(reply_prompt.contains("write a reply to the customer"));
    assert_eq!(requests[1].temperature, 0.3);
}

#[tokio::test]
async fn test_unknown_skill() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::new());
    let invoker = StubInvoker::new("unused");
    let runtime = runtime(catalog_with_refund(&dir), &client, &invoker);

    let err = runtime.execute_skill("weather", "rain?").await.err().unwrap();
    assert!(matches!(err, Error::NotFound(_)));
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn test_compile_failure_never_starts() {
    let dir = TempDir::new().unwrap();
    let client = Arc::new(ScriptedClient::with_replies(["use skill: refund"]));
    client.push_error(ProviderError::ServerError("overloaded".into()));
    let invoker = StubInvoker::new("unused");
    let runtime = runtime(catalog_with_refund(&dir), &client, &invoker);

    let err = runtime.run("I want a refund").await.err().unwrap();
    assert!(matches!(err, Error::CompileFailure(_)));
    assert_eq!(client.calls(), 2);
    assert!(invoker.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_definition_is_recompiled_every_run() {
    let dir = TempDir::new().unwrap();
    let minimal = r#"<bpmn:definitions xmlns:bpmn="http://www.omg.org/spec/BPMN/20100524/MODEL"><bpmn:process id="p"><bpmn:startEvent id="s"/><bpmn:endEvent id="e"/><bpmn:sequenceFlow id="f" sourceRef="s" targetRef="e"/></bpmn:process></bpmn:definitions>"#;
    let client = Arc::new(ScriptedClient::with_replies([minimal, minimal]));
    let invoker = StubInvoker::new("unused");
    let runtime = runtime(catalog_with_refund(&dir), &client, &invoker);

    for _ in 0..2 {
        let instance = runtime.execute_skill("refund", "again").await.unwrap();
        assert!(instance.wait().await.unwrap().is_success());
    }
    assert_eq!(client.calls(), 2);
}
