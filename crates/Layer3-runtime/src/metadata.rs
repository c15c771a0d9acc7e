//! Task metadata cache
//!
//! `ActivityStart` 시점에 documentation 블록을 파싱해서 액티비티 id 로
//! 저장합니다. 파싱에 실패한 슬롯은 poisoned 상태가 되고, 해당 액티비티의
//! 다음 wait / service call 만 실패시킵니다.

use crate::descriptor::TaskDescriptor;
use skillflow_foundation::{Error, Result};
use skillflow_task::{ActivityId, ActivityNode};
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
enum Slot {
    Parsed(TaskDescriptor),
    Poisoned(String),
}

/// Descriptors of one execution instance, keyed by activity id
#[derive(Debug, Default)]
pub struct TaskMetadataCache {
    slots: HashMap<ActivityId, Slot>,
}

impl TaskMetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the documentation of a started activity
    ///
    /// Nodes without documentation leave the cache untouched. A later start
    /// of the same id overwrites the slot.
    pub fn record(&mut self, node: &ActivityNode) -> Result<()> {
        let Some(doc) = node.documentation.as_deref() else {
            return Ok(());
        };

        match TaskDescriptor::parse(doc) {
            Ok(descriptor) => {
                debug!("Descriptor recorded for '{}'", node.id);
                self.slots.insert(node.id.clone(), Slot::Parsed(descriptor));
                Ok(())
            }
            Err(e) => {
                warn!("Invalid documentation on '{}': {}", node.id, e);
                self.slots
                    .insert(node.id.clone(), Slot::Poisoned(e.to_string()));
                Err(Error::MetadataParse {
                    activity_id: node.id.to_string(),
                    message: e.to_string(),
                })
            }
        }
    }

    /// Descriptor of an activity, `Err` if its documentation was invalid
    pub fn lookup(&self, id: &ActivityId) -> Result<Option<&TaskDescriptor>> {
        match self.slots.get(id) {
            None => Ok(None),
            Some(Slot::Parsed(descriptor)) => Ok(Some(descriptor)),
            Some(Slot::Poisoned(message)) => Err(Error::MetadataParse {
                activity_id: id.to_string(),
                message: message.clone(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{VariableRef, VariableType};
    use skillflow_task::ActivityKind;

    fn user_task(id: &str, doc: Option<&str>) -> ActivityNode {
        let node = ActivityNode::new(id, ActivityKind::UserTask).with_name("Confirm");
        match doc {
            Some(doc) => node.with_documentation(doc),
            None => node,
        }
    }

    #[test]
    fn test_start_round_trip() {
        let descriptor = TaskDescriptor {
            hint: "Confirm?".into(),
            prompt: String::new(),
            input: VariableRef::new("userInput", VariableType::Text),
            output: VariableRef::new("answer", VariableType::Boolean),
        };
        let mut cache = TaskMetadataCache::new();
        let node = user_task("Task_1", Some(&descriptor.to_documentation()));

        cache.record(&node).unwrap();
        assert_eq!(cache.lookup(&node.id).unwrap(), Some(&descriptor));
    }

    #[test]
    fn test_without_documentation() {
        let mut cache = TaskMetadataCache::new();
        let node = user_task("Task_1", None);
        cache.record(&node).unwrap();
        assert!(cache.lookup(&node.id).unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_redefinition_overwrites() {
        let mut cache = TaskMetadataCache::new();
        cache
            .record(&user_task("T", Some(r#"{"hint": "first"}"#)))
            .unwrap();
        cache
            .record(&user_task("T", Some(r#"{"hint": "second"}"#)))
            .unwrap();

        let id = ActivityId::from("T");
        assert_eq!(cache.lookup(&id).unwrap().unwrap().hint, "second");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalid_documentation_poisons_only_that_activity() {
        let mut cache = TaskMetadataCache::new();
        let err = cache.record(&user_task("Bad", Some("not json"))).unwrap_err();
        assert!(matches!(err, Error::MetadataParse { ref activity_id, .. } if activity_id == "Bad"));

        cache
            .record(&user_task("Good", Some(r#"{"hint": "ok"}"#)))
            .unwrap();

        assert!(cache.lookup(&ActivityId::from("Bad")).is_err());
        assert!(cache.lookup(&ActivityId::from("Good")).unwrap().is_some());
    }
}
