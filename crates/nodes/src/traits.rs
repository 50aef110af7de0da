//! The `ExecutableNode` trait: the contract every node handler must fulfil.

use async_trait::async_trait;
use serde_json::Value;

use crate::{ExecutionContext, NodeError};

/// Everything a handler receives for one node execution.
#[derive(Debug, Clone)]
pub struct NodeInput {
    /// ID of the node being executed.
    pub node_id: String,
    /// The node's type-specific configuration, as persisted.
    pub data: Value,
    /// Context produced by the previous node (or the trigger payload).
    pub context: ExecutionContext,
}

/// The core node trait.
///
/// One implementation exists per `NodeType`. Implementations may perform
/// I/O and decide for themselves which failures are retryable.
#[async_trait]
pub trait ExecutableNode: Send + Sync {
    /// Execute the node and return the context handed to the next node.
    async fn execute(&self, input: NodeInput) -> Result<ExecutionContext, NodeError>;
}
