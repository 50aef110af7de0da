//! Engine-level error types.

use nodes::{ExecutionContext, NodeError};
use thiserror::Error;

/// The workflow graph itself is invalid. Raised by the sorter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Two or more nodes share the same ID.
    #[error("duplicate node ID: '{0}'")]
    DuplicateNodeId(String),

    /// A connection references a node ID that doesn't exist in the workflow.
    #[error("connection references unknown node '{node_id}' ({side} side)")]
    DanglingReference {
        node_id: String,
        side: &'static str,
    },

    /// Topological sort could not order every node.
    #[error("workflow graph contains a cycle: {}", node_ids.join(" -> "))]
    CyclicGraph {
        /// Nodes of one cycle, in edge order.
        node_ids: Vec<String>,
    },
}

/// Errors produced by the workflow engine (validation + execution).
///
/// Everything except a retryable node failure or a storage failure is
/// fatal: re-running without changing the workflow or the deployment
/// cannot succeed. See [`EngineError::is_retriable`].
#[derive(Debug, Error)]
pub enum EngineError {
    // ------ Definition errors ------

    /// The trigger event carried no workflow id.
    #[error("workflow ID is missing")]
    MissingWorkflowId,

    /// The id does not resolve to a persisted workflow.
    #[error("workflow '{0}' not found")]
    WorkflowNotFound(String),

    /// The trigger payload is not a JSON object.
    #[error("invalid initial data: {0}")]
    InvalidInitialData(String),

    /// The graph could not be sorted.
    #[error("invalid workflow definition: {0}")]
    InvalidGraph(#[from] GraphError),

    /// More than one node of a single-instance trigger type.
    #[error("workflow has {} '{node_type}' nodes, at most one is allowed", node_ids.len())]
    MultipleTriggers {
        node_type: String,
        node_ids: Vec<String>,
    },

    /// No handler is registered for a node's type tag.
    #[error("no executor found for node type '{node_type}' (node '{node_id}')")]
    UnknownNodeType {
        node_id: String,
        node_type: String,
    },

    // ------ Execution errors ------

    /// A node handler failed; the run stops at this node.
    #[error("node '{node_id}' failed: {source}")]
    NodeFailed {
        node_id: String,
        /// Context the failing node was given.
        context: ExecutionContext,
        #[source]
        source: NodeError,
    },

    /// The run was cancelled before `node_id` started.
    #[error("run cancelled before node '{node_id}'")]
    Cancelled { node_id: String },

    /// The graph-loading collaborator failed.
    #[error("failed to load workflow '{workflow_id}': {source}")]
    Storage {
        workflow_id: String,
        #[source]
        source: anyhow::Error,
    },
}

impl EngineError {
    /// Whether re-running the same event could succeed.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::NodeFailed { source, .. } => source.is_retryable(),
            Self::Storage { .. } => true,
            Self::MissingWorkflowId
            | Self::WorkflowNotFound(_)
            | Self::InvalidInitialData(_)
            | Self::InvalidGraph(_)
            | Self::MultipleTriggers { .. }
            | Self::UnknownNodeType { .. }
            | Self::Cancelled { .. } => false,
        }
    }

    /// Id of the node the run stopped at, if the failure is tied to one.
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Self::NodeFailed { node_id, .. }
            | Self::UnknownNodeType { node_id, .. }
            | Self::Cancelled { node_id } => Some(node_id),
            _ => None,
        }
    }
}
