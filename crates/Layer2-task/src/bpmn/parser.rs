//! BPMN 2.0 XML parser
//!
//! 지원 요소: process, startEvent, endEvent, userTask, serviceTask, scriptTask,
//! 기타 pass-through 태스크/중간 이벤트, sequenceFlow, documentation.
//! Gateway, subProcess 등 분기/중첩 구조는 거부합니다.

use crate::node::{ActivityId, ActivityKind, ActivityNode, ServiceBinding};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use skillflow_foundation::{Error, Result};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// 그대로 통과시키는 액티비티 요소
const PASS_THROUGH: &[&str] = &[
    "task",
    "manualTask",
    "sendTask",
    "receiveTask",
    "businessRuleTask",
    "intermediateThrowEvent",
    "intermediateCatchEvent",
];

/// 거부하는 요소 (분기/중첩)
const UNSUPPORTED: &[&str] = &[
    "exclusiveGateway",
    "parallelGateway",
    "inclusiveGateway",
    "eventBasedGateway",
    "complexGateway",
    "subProcess",
    "callActivity",
    "boundaryEvent",
    "transaction",
];

/// Sequence flow between two activities
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceFlow {
    pub id: Option<String>,
    pub source: ActivityId,
    pub target: ActivityId,
}

/// Parsed process definition
#[derive(Debug, Clone, Default)]
pub struct ProcessDefinition {
    pub process_id: Option<String>,

    /// Activities in document order
    pub nodes: Vec<ActivityNode>,

    pub flows: Vec<SequenceFlow>,
}

impl ProcessDefinition {
    pub fn node(&self, id: &ActivityId) -> Option<&ActivityNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// 시작 이벤트부터 sequence flow를 따라간 실행 순서
    ///
    /// Without any sequence flow the document order is used.
    pub fn execution_order(&self) -> Result<Vec<ActivityNode>> {
        if self.flows.is_empty() {
            debug!("No sequence flows; using document order");
            return Ok(self.nodes.clone());
        }

        let starts: Vec<&ActivityNode> = self
            .nodes
            .iter()
            .filter(|n| n.kind == ActivityKind::StartEvent)
            .collect();
        let start = match starts.as_slice() {
            [start] => *start,
            [] => return Err(Error::Engine("Process has no startEvent".into())),
            _ => return Err(Error::Engine("Process has more than one startEvent".into())),
        };

        let mut outgoing: HashMap<&ActivityId, &ActivityId> = HashMap::new();
        for flow in &self.flows {
            if outgoing.insert(&flow.source, &flow.target).is_some() {
                return Err(Error::Engine(format!(
                    "Activity '{}' branches; only sequential processes are supported",
                    flow.source
                )));
            }
        }

        let mut order = Vec::new();
        let mut visited = HashSet::new();
        let mut current = start;
        loop {
            if !visited.insert(&current.id) {
                return Err(Error::Engine(format!(
                    "Sequence flow loops back to '{}'",
                    current.id
                )));
            }
            order.push(current.clone());

            let Some(target) = outgoing.get(&current.id) else {
                break;
            };
            current = self.node(target).ok_or_else(|| {
                Error::Engine(format!("Sequence flow targets unknown activity '{}'", target))
            })?;
        }

        if order.len() < self.nodes.len() {
            warn!(
                "{} activities are unreachable from the startEvent",
                self.nodes.len() - order.len()
            );
        }

        Ok(order)
    }
}

/// BPMN XML 파싱
pub fn parse_definition(xml: &str) -> Result<ProcessDefinition> {
    let mut parser = Parser::default();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    loop {
        let event = reader.read_event().map_err(|e| {
            Error::Engine(format!(
                "Invalid BPMN XML at position {}: {}",
                reader.error_position(),
                e
            ))
        })?;

        match event {
            Event::Start(e) => parser.open(&e, false)?,
            Event::Empty(e) => parser.open(&e, true)?,
            Event::End(_) => parser.close(),
            Event::Text(t) => {
                if parser.in_documentation {
                    let text = t
                        .unescape()
                        .map_err(|e| Error::Engine(format!("Invalid documentation text: {}", e)))?;
                    parser.documentation.push_str(&text);
                }
            }
            Event::CData(c) => {
                if parser.in_documentation {
                    parser
                        .documentation
                        .push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    parser.finish()
}

#[derive(Default)]
struct Parser {
    definition: ProcessDefinition,
    seen_ids: HashSet<String>,
    process_count: usize,
    depth: usize,

    /// 열려 있는 액티비티와 그 깊이
    current: Option<(ActivityNode, usize)>,

    in_documentation: bool,
    documentation_depth: usize,
    documentation: String,
}

impl Parser {
    fn open(&mut self, e: &BytesStart<'_>, empty: bool) -> Result<()> {
        if !empty {
            self.depth += 1;
        }

        let local = e.local_name();
        let name = std::str::from_utf8(local.as_ref())
            .map_err(|e| Error::Engine(format!("Invalid element name: {}", e)))?
            .to_string();

        match name.as_str() {
            "process" => {
                self.process_count += 1;
                if self.process_count > 1 {
                    return Err(Error::Engine(
                        "Definitions with more than one process are not supported".into(),
                    ));
                }
                self.definition.process_id = attr(e, "id")?;
            }
            "sequenceFlow" => {
                let source = attr(e, "sourceRef")?;
                let target = attr(e, "targetRef")?;
                match (source, target) {
                    (Some(source), Some(target)) => self.definition.flows.push(SequenceFlow {
                        id: attr(e, "id")?,
                        source: source.into(),
                        target: target.into(),
                    }),
                    _ => {
                        return Err(Error::Engine(
                            "sequenceFlow requires sourceRef and targetRef".into(),
                        ))
                    }
                }
            }
            "documentation" if self.current.is_some() && !empty => {
                self.in_documentation = true;
                self.documentation_depth = self.depth;
                self.documentation.clear();
            }
            other if UNSUPPORTED.contains(&other) => {
                return Err(Error::Engine(format!(
                    "'{}' is not supported; only sequential processes can run",
                    other
                )));
            }
            "startEvent" | "endEvent" | "userTask" | "serviceTask" | "scriptTask" => {
                self.open_activity(e, &name, empty)?;
            }
            other if PASS_THROUGH.contains(&other) => {
                self.open_activity(e, other, empty)?;
            }
            _ => {}
        }

        Ok(())
    }

    fn open_activity(&mut self, e: &BytesStart<'_>, element: &str, empty: bool) -> Result<()> {
        if let Some((open, _)) = &self.current {
            return Err(Error::Engine(format!(
                "Nested activity '{}' inside '{}' is not supported",
                element, open.id
            )));
        }

        let id = attr(e, "id")?
            .ok_or_else(|| Error::Engine(format!("{} without id", element)))?;
        if !self.seen_ids.insert(id.clone()) {
            return Err(Error::Engine(format!("Duplicate activity id '{}'", id)));
        }

        let kind = ActivityKind::from_element(element);
        let mut node = ActivityNode::new(id, kind.clone());
        node.name = attr(e, "name")?;
        node.binding = match kind {
            ActivityKind::ServiceTask => {
                let implementation = attr(e, "implementation")?.unwrap_or_default();
                Some(ServiceBinding::from_implementation(&implementation).ok_or_else(|| {
                    Error::Engine(format!(
                        "serviceTask '{}' must be bound to llmService or mcpService (got '{}')",
                        node.id, implementation
                    ))
                })?)
            }
            ActivityKind::ScriptTask => Some(ServiceBinding::Script),
            _ => None,
        };

        if empty {
            self.definition.nodes.push(node);
        } else {
            self.current = Some((node, self.depth));
        }
        Ok(())
    }

    fn close(&mut self) {
        if self.in_documentation && self.depth == self.documentation_depth {
            self.in_documentation = false;
            if let Some((node, _)) = self.current.as_mut() {
                let text = self.documentation.trim();
                if !text.is_empty() {
                    node.documentation = Some(text.to_string());
                }
            }
        }

        if matches!(&self.current, Some((_, depth)) if *depth == self.depth) {
            if let Some((node, _)) = self.current.take() {
                self.definition.nodes.push(node);
            }
        }

        self.depth = self.depth.saturating_sub(1);
    }

    fn finish(self) -> Result<ProcessDefinition> {
        if self.process_count == 0 {
            return Err(Error::Engine("No <process> element found".into()));
        }
        if self.definition.nodes.is_empty() {
            return Err(Error::Engine("Process has no activities".into()));
        }
        Ok(self.definition)
    }
}

/// 속성 값 (namespace prefix 무시)
fn attr(e: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    for attribute in e.attributes() {
        let attribute =
            attribute.map_err(|err| Error::Engine(format!("Invalid attribute: {}", err)))?;
        if attribute.key.local_name().as_ref() == name.as_bytes() {
            let value = attribute
                .unescape_value()
                .map_err(|err| Error::Engine(format!("Invalid attribute value: {}", err)))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}
