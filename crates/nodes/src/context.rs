//! The value threaded from node to node during a run.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::NodeError;

/// Accumulated key-value data passed along the execution order.
///
/// Handlers take the context by value and hand back the next one, so a
/// handler never holds on to a context the engine has moved past.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionContext(Map<String, Value>);

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from a trigger payload.
    ///
    /// `null` becomes an empty context; anything other than an object is a
    /// fatal error since downstream nodes address the context by key.
    pub fn from_payload(payload: Value) -> Result<Self, NodeError> {
        match payload {
            Value::Null => Ok(Self::new()),
            Value::Object(map) => Ok(Self(map)),
            other => Err(NodeError::Fatal(format!(
                "context must be a JSON object, got {other}"
            ))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Return a context with `key` set to `value`, replacing any earlier entry.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for ExecutionContext {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
