//! `MockNode`: a test double for `ExecutableNode`.
//!
//! Useful in unit and integration tests where a real node implementation is
//! either unavailable or irrelevant.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};

use crate::{ExecutableNode, ExecutionContext, NodeError, traits::NodeInput};

/// Behaviour injected into `MockNode` at construction time.
pub enum MockBehaviour {
    /// Store a specific JSON value in the context under the mock's name.
    ReturnValue(Value),
    /// Fail with a `Retryable` error.
    FailRetryable(String),
    /// Fail with a `Fatal` error.
    FailFatal(String),
    /// Fail with a `Retryable` error for the first `failures` calls, then
    /// behave like `ReturnValue`.
    Flaky { failures: usize, value: Value },
}

/// A mock node that records every call it receives and returns a
/// programmer-specified result.
pub struct MockNode {
    /// Label used in test assertions; also the context key it writes.
    pub name: String,
    /// What the node will do when `execute` is called.
    pub behaviour: MockBehaviour,
    /// All inputs seen by this node (in call order).
    pub calls: Arc<Mutex<Vec<NodeInput>>>,
}

impl MockNode {
    fn with_behaviour(name: impl Into<String>, behaviour: MockBehaviour) -> Self {
        Self {
            name: name.into(),
            behaviour,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock that always succeeds, writing `value` under its name.
    pub fn returning(name: impl Into<String>, value: Value) -> Self {
        Self::with_behaviour(name, MockBehaviour::ReturnValue(value))
    }

    /// Create a mock that always fails with a `Fatal` error.
    pub fn failing_fatal(name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::with_behaviour(name, MockBehaviour::FailFatal(msg.into()))
    }

    /// Create a mock that always fails with a `Retryable` error.
    pub fn failing_retryable(name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::with_behaviour(name, MockBehaviour::FailRetryable(msg.into()))
    }

    /// Create a mock that fails retryably `failures` times before succeeding.
    pub fn flaky(name: impl Into<String>, failures: usize, value: Value) -> Self {
        Self::with_behaviour(name, MockBehaviour::Flaky { failures, value })
    }

    /// Number of times this node has been executed.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Node ids this mock was invoked for, in call order.
    pub fn node_ids(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|c| c.node_id.clone()).collect()
    }

    /// The context received on the most recent call.
    pub fn last_context(&self) -> Option<ExecutionContext> {
        self.calls.lock().unwrap().last().map(|c| c.context.clone())
    }
}

#[async_trait]
impl ExecutableNode for MockNode {
    async fn execute(&self, input: NodeInput) -> Result<ExecutionContext, NodeError> {
        let attempt = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(input.clone());
            calls.len()
        };

        match &self.behaviour {
            MockBehaviour::ReturnValue(v) => Ok(input.context.with(self.name.clone(), v.clone())),
            MockBehaviour::FailRetryable(msg) => Err(NodeError::Retryable(msg.clone())),
            MockBehaviour::FailFatal(msg)     => Err(NodeError::Fatal(msg.clone())),
            MockBehaviour::Flaky { failures, value } => {
                if attempt <= *failures {
                    Err(NodeError::Retryable(format!("{} attempt {attempt} failed", self.name)))
                } else {
                    Ok(input.context.with(self.name.clone(), value.clone()))
                }
            }
        }
    }
}
