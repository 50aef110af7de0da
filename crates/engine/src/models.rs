//! Core domain models for the workflow engine.
//!
//! A workflow is a set of typed nodes plus directed connections between
//! them. These types are what the graph loaders produce and what the
//! sorter and executor consume; they carry no behaviour of their own.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use nodes::{ExecutionContext, NodeType};

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A single vertex in the workflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier within this workflow (referenced by connections).
    pub id: String,
    /// Raw type tag as persisted. Kept as a string so tags this build does
    /// not know about reach the registry and fail there, naming the node.
    #[serde(rename = "type")]
    pub node_type: String,
    /// Type-specific configuration passed to the handler.
    #[serde(default)]
    pub data: Value,
}

impl Node {
    pub fn new(id: impl Into<String>, node_type: NodeType, data: Value) -> Self {
        Self::with_tag(id, node_type.as_str(), data)
    }

    /// Build a node from an arbitrary tag string.
    pub fn with_tag(id: impl Into<String>, tag: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            node_type: tag.into(),
            data,
        }
    }

    /// The parsed tag, or `None` when this build does not know it.
    pub fn kind(&self) -> Option<NodeType> {
        self.node_type.parse().ok()
    }
}

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

/// Directed edge: `target_node_id` runs after `source_node_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub source_node_id: String,
    pub target_node_id: String,
}

impl Connection {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source_node_id: source.into(),
            target_node_id: target.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// WorkflowGraph
// ---------------------------------------------------------------------------

/// Everything the engine needs to know about a persisted workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowGraph {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Declared order matters: it breaks ties between equally-ready nodes.
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl WorkflowGraph {
    pub fn new(id: impl Into<String>, nodes: Vec<Node>, connections: Vec<Connection>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            nodes,
            connections,
        }
    }
}

// ---------------------------------------------------------------------------
// Trigger event / run result
// ---------------------------------------------------------------------------

/// The inbound event that starts a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerEvent {
    /// Delivery id. A redelivered event with the same id resumes the
    /// earlier run instead of starting over.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub workflow_id: Option<String>,
    #[serde(default, alias = "InitialData", skip_serializing_if = "Option::is_none")]
    pub initial_data: Option<Value>,
}

impl TriggerEvent {
    pub fn new(workflow_id: impl Into<String>) -> Self {
        Self {
            workflow_id: Some(workflow_id.into()),
            ..Self::default()
        }
    }

    pub fn with_initial_data(mut self, data: Value) -> Self {
        self.initial_data = Some(data);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// The outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub run_id: String,
    /// Node ids in the order they executed.
    pub order: Vec<String>,
    /// Context returned by the last node.
    pub result: ExecutionContext,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn node_deserialises_unknown_tags() {
        let node: Node = serde_json::from_value(json!({ "id": "n1", "type": "UNKNOWN" })).unwrap();
        assert_eq!(node.node_type, "UNKNOWN");
        assert_eq!(node.kind(), None);
        assert!(node.data.is_null());
    }

    #[test]
    fn trigger_event_accepts_legacy_initial_data_key() {
        let event: TriggerEvent =
            serde_json::from_value(json!({ "workflowId": "wf", "InitialData": { "a": 1 } })).unwrap();
        assert_eq!(event.workflow_id.as_deref(), Some("wf"));
        assert_eq!(event.initial_data, Some(json!({ "a": 1 })));
    }

    #[test]
    fn graph_file_format() {
        let graph: WorkflowGraph = serde_json::from_value(json!({
            "id": "wf",
            "nodes": [
                { "id": "a", "type": "MANUAL_TRIGGER" },
                { "id": "b", "type": "HTTP_REQUEST", "data": { "endpoint": "http://x" } }
            ],
            "connections": [{ "sourceNodeId": "a", "targetNodeId": "b" }]
        }))
        .unwrap();

        assert_eq!(graph.nodes[0].kind(), Some(NodeType::ManualTrigger));
        assert_eq!(graph.connections, vec![Connection::new("a", "b")]);
    }
}
