//! Sequential engine 통합 테스트 - 이벤트 순서와 resume 동작 검증
//!
//! `cargo test -p skillflow-task --test sequential_engine_test`

use skillflow_foundation::Error;
use skillflow_task::{
    ActivityKind, EngineEvent, EngineListener, ExecutionState, ProcessEngine, SequentialEngine,
    ServiceBinding,
};
use std::sync::Arc;
use tokio::sync::mpsc;

const PROCESS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<bpmn:definitions xmlns:bpmn="http://www.omg.org/spec/BPMN/20100524/MODEL">
  <bpmn:process id="Translate">
    <bpmn:startEvent id="Start" />
    <bpmn:userTask id="AskText" name="Ask for the text" />
    <bpmn:serviceTask id="Translate" name="Translate" implementation="${environment.services.llmService}" />
    <bpmn:endEvent id="End" />
    <bpmn:sequenceFlow id="f1" sourceRef="Start" targetRef="AskText" />
    <bpmn:sequenceFlow id="f2" sourceRef="AskText" targetRef="Translate" />
    <bpmn:sequenceFlow id="f3" sourceRef="Translate" targetRef="End" />
  </bpmn:process>
</bpmn:definitions>"#;

#[tokio::test]
async fn test_events_in_order_with_resume() {
    let process = SequentialEngine::new().compile("translate", PROCESS).unwrap();
    assert_eq!(process.activities().len(), 4);

    let (tx, mut rx) = mpsc::unbounded_channel::<EngineEvent>();
    let listener: Arc<dyn EngineListener> = Arc::new(tx);
    let run = tokio::spawn(process.run(listener));

    let mut seen = Vec::new();
    while let Some(event) = rx.recv().await {
        seen.push(format!("{}:{}", event.name(), event.node().id));
        match event {
            EngineEvent::Wait { node, resume } => {
                assert_eq!(node.kind, ActivityKind::UserTask);
                resume.resume().unwrap();
            }
            EngineEvent::ServiceCall {
                binding,
                completion,
                ..
            } => {
                assert_eq!(binding, ServiceBinding::Llm);
                completion.complete().unwrap();
            }
            _ => {}
        }
    }

    let summary = run.await.unwrap().unwrap();
    assert_eq!(summary.state, ExecutionState::Completed);
    assert_eq!(summary.completed.len(), 4);
    assert_eq!(
        seen,
        vec![
            "activity.start:Start",
            "activity.end:Start",
            "activity.start:AskText",
            "wait:AskText",
            "activity.end:AskText",
            "activity.start:Translate",
            "service.call:Translate",
            "activity.end:Translate",
            "activity.start:End",
            "activity.end:End",
        ]
    );
}

#[tokio::test]
async fn test_service_failure_ends_run() {
    let process = SequentialEngine::new().compile("translate", PROCESS).unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel::<EngineEvent>();
    let run = tokio::spawn(process.run(Arc::new(tx)));

    while let Some(event) = rx.recv().await {
        match event {
            EngineEvent::Wait { resume, .. } => resume.resume().unwrap(),
            EngineEvent::ServiceCall { completion, .. } => completion
                .fail(Error::service("Translate", "model unavailable"))
                .unwrap(),
            _ => {}
        }
    }

    let summary = run.await.unwrap().unwrap();
    assert!(matches!(summary.state, ExecutionState::Failed(ref msg) if msg.contains("model unavailable")));
    assert_eq!(summary.failed_activity.unwrap().as_str(), "Translate");
    assert_eq!(summary.completed.len(), 2);
}

#[tokio::test]
async fn test_dropped_listener_cancels_run() {
    let process = SequentialEngine::new().compile("translate", PROCESS).unwrap();
    let (tx, rx) = mpsc::unbounded_channel::<EngineEvent>();
    drop(rx);

    let result = process.run(Arc::new(tx)).await;
    assert!(matches!(result, Err(Error::Cancelled)));
}

#[test]
fn test_compile_rejects_gateways() {
    let xml = PROCESS.replace(
        r#"<bpmn:endEvent id="End" />"#,
        r#"<bpmn:endEvent id="End" /><bpmn:parallelGateway id="Fork" />"#,
    );
    assert!(matches!(
        SequentialEngine::new().compile("translate", &xml),
        Err(Error::Engine(_))
    ));
}
