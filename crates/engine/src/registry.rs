//! Executor registry: maps a node type tag to its handler.
//!
//! The built-in table is produced by an exhaustive `match` over
//! [`NodeType`], so a new tag without a handler fails to compile. Only tags
//! that arrive as data (a graph written by a newer editor) can miss at
//! runtime, and [`ExecutorRegistry::resolve`] reports those.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use nodes::{
    ExecutableNode, HttpRequestConfig, HttpRequestNode, InitialNode, ManualTriggerNode, NodeType,
};
use thiserror::Error;

/// A tag with no registered handler.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("no executor found for node type '{0}'")]
pub struct UnknownNodeType(pub String);

/// Read-only after construction; share it across runs behind an `Arc`.
#[derive(Clone)]
pub struct ExecutorRegistry {
    handlers: HashMap<NodeType, Arc<dyn ExecutableNode>>,
}

impl ExecutorRegistry {
    /// Registry with the production handler for every declared tag.
    pub fn builtin(http: &HttpRequestConfig) -> anyhow::Result<Self> {
        let http_node: Arc<dyn ExecutableNode> =
            Arc::new(HttpRequestNode::new(http).context("failed to build HTTP client")?);

        let handlers = NodeType::ALL
            .into_iter()
            .map(|kind| {
                let handler: Arc<dyn ExecutableNode> = match kind {
                    NodeType::ManualTrigger => Arc::new(ManualTriggerNode),
                    NodeType::Initial => Arc::new(InitialNode),
                    NodeType::HttpRequest => http_node.clone(),
                };
                (kind, handler)
            })
            .collect();

        Ok(Self { handlers })
    }

    /// Replace the handler for one tag. Meant for wiring at startup
    /// (and for tests); the registry is never mutated while runs execute.
    pub fn with_handler(mut self, kind: NodeType, handler: Arc<dyn ExecutableNode>) -> Self {
        self.handlers.insert(kind, handler);
        self
    }

    /// Look up the handler for a persisted tag.
    pub fn resolve(&self, tag: &str) -> Result<Arc<dyn ExecutableNode>, UnknownNodeType> {
        tag.parse::<NodeType>()
            .ok()
            .and_then(|kind| self.handlers.get(&kind))
            .cloned()
            .ok_or_else(|| UnknownNodeType(tag.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodes::mock::MockNode;
    use nodes::{ExecutionContext, NodeInput};
    use serde_json::{json, Value};

    fn registry() -> ExecutorRegistry {
        ExecutorRegistry::builtin(&HttpRequestConfig::default()).unwrap()
    }

    #[test]
    fn every_declared_tag_resolves() {
        let registry = registry();
        for kind in NodeType::ALL {
            assert!(registry.resolve(kind.as_str()).is_ok(), "{kind} has no handler");
        }
    }

    #[test]
    fn undeclared_tag_fails() {
        let err = registry().resolve("UNKNOWN").err().unwrap();
        assert_eq!(err, UnknownNodeType("UNKNOWN".into()));
    }

    #[tokio::test]
    async fn with_handler_replaces_builtin() {
        let registry = registry().with_handler(
            NodeType::HttpRequest,
            Arc::new(MockNode::returning("stub", json!(1))),
        );
        let handler = registry.resolve("HTTP_REQUEST").unwrap();
        let out = handler
            .execute(NodeInput {
                node_id: "n".into(),
                data: Value::Null,
                context: ExecutionContext::new(),
            })
            .await
            .unwrap();
        assert_eq!(out.get("stub"), Some(&json!(1)));
    }
}
