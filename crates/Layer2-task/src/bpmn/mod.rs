//! Reference BPMN 2.0 engine (sequential processes only)

mod engine;
mod parser;

pub use engine::{SequentialEngine, SequentialProcess};
pub use parser::{parse_definition, ProcessDefinition, SequenceFlow};
