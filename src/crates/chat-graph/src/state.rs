//! Graph state and update merging
//!
//! State is a JSON object. Node outputs are merged key by key: most keys are
//! replaced, while keys registered as append keys (typically `messages`)
//! extend the existing array so histories only ever grow.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::error::{GraphError, Result};
use crate::messages::Message;

/// Typed view of the conversation state used by the chat services
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphState {
    /// Ordered conversation history
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Set once the workflow has produced its final reply
    #[serde(default)]
    pub processing_complete: bool,
}

impl GraphState {
    /// Parse from a raw state object, tolerating missing keys
    pub fn from_value(value: &Value) -> Result<Self> {
        Ok(serde_json::from_value(value.clone())?)
    }

    /// Convert to a raw state object
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// How node outputs are folded into the state
#[derive(Debug, Clone, Default)]
pub(crate) struct StateSchema {
    append_keys: HashSet<String>,
}

impl StateSchema {
    pub(crate) fn add_append_key(&mut self, key: impl Into<String>) {
        self.append_keys.insert(key.into());
    }

    /// Merge `update` into `state`
    ///
    /// `null` updates are a no-op. Anything else must be an object.
    pub(crate) fn apply(&self, state: &mut Value, update: &Value) -> Result<()> {
        let update = match update {
            Value::Null => return Ok(()),
            Value::Object(map) => map,
            other => {
                return Err(GraphError::State(format!(
                    "node updates must be JSON objects, got {other}"
                )))
            }
        };

        if !state.is_object() {
            *state = Value::Object(Map::new());
        }
        let Some(target) = state.as_object_mut() else {
            return Ok(());
        };

        for (key, value) in update {
            if self.append_keys.contains(key) {
                let items = match value {
                    Value::Array(items) => items.clone(),
                    Value::Null => continue,
                    single => vec![single.clone()],
                };
                match target.get_mut(key) {
                    Some(Value::Array(existing)) => existing.extend(items),
                    _ => {
                        target.insert(key.clone(), Value::Array(items));
                    }
                }
            } else {
                target.insert(key.clone(), value.clone());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> StateSchema {
        let mut schema = StateSchema::default();
        schema.add_append_key("messages");
        schema
    }

    #[test]
    fn test_replace_and_append() {
        let mut state = json!({"messages": [{"role": "user", "content": "a"}], "processing_complete": false});
        schema()
            .apply(
                &mut state,
                &json!({"messages": [{"role": "assistant", "content": "b"}], "processing_complete": true}),
            )
            .unwrap();

        let typed = GraphState::from_value(&state).unwrap();
        assert_eq!(typed.messages, vec![Message::human("a"), Message::assistant("b")]);
        assert!(typed.processing_complete);
    }

    #[test]
    fn test_single_value_appended() {
        let mut state = json!({});
        schema()
            .apply(&mut state, &json!({"messages": {"role": "user", "content": "x"}}))
            .unwrap();
        assert_eq!(state["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_null_update_is_noop() {
        let mut state = json!({"k": 1});
        schema().apply(&mut state, &Value::Null).unwrap();
        assert_eq!(state, json!({"k": 1}));
    }

    #[test]
    fn test_non_object_update_rejected() {
        let mut state = json!({});
        let err = schema().apply(&mut state, &json!([1, 2])).unwrap_err();
        assert!(matches!(err, GraphError::State(_)));
    }

    #[test]
    fn test_graph_state_defaults() {
        let state = GraphState::from_value(&json!({})).unwrap();
        assert_eq!(state, GraphState::default());
    }
}
