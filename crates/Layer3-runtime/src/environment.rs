//! Per-instance variable environment

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use skillflow_foundation::{Error, Result};

/// Name of the variable seeded with the user's utterance
pub const USER_INPUT: &str = "userInput";

/// Variable name → value mapping owned by one execution instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableEnvironment {
    vars: Map<String, Value>,
}

impl VariableEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeded with the user's utterance
    pub fn with_user_input(input: impl Into<String>) -> Self {
        let mut env = Self::new();
        env.vars
            .insert(USER_INPUT.to_string(), Value::String(input.into()));
        env
    }

    /// Write a variable; an empty name is rejected
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput(
                "variable name must not be empty".to_string(),
            ));
        }
        self.vars.insert(name.to_string(), value.into());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Variable as text: strings verbatim, everything else as JSON
    pub fn render(&self, name: &str) -> Option<String> {
        self.get(name).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Whole environment as JSON text
    pub fn snapshot_json(&self) -> String {
        Value::Object(self.vars.clone()).to_string()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_seed_and_render() {
        let mut env = VariableEnvironment::with_user_input("I want a refund");
        env.set("order", json!({"id": 7})).unwrap();
        env.set("count", 3).unwrap();

        assert_eq!(env.render(USER_INPUT).as_deref(), Some("I want a refund"));
        assert_eq!(env.render("order").as_deref(), Some(r#"{"id":7}"#));
        assert_eq!(env.render("count").as_deref(), Some("3"));
        assert!(env.render("missing").is_none());
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut env = VariableEnvironment::new();
        assert!(matches!(env.set("  ", "x"), Err(Error::InvalidInput(_))));
        assert!(env.is_empty());
    }

    #[test]
    fn test_snapshot_json() {
        let env = VariableEnvironment::with_user_input("hi");
        let value: Value = serde_json::from_str(&env.snapshot_json()).unwrap();
        assert_eq!(value, json!({"userInput": "hi"}));
    }
}
