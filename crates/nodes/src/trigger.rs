//! Entry-point nodes. Neither does any work; they mark where a run starts.

use async_trait::async_trait;
use tracing::debug;

use crate::{ExecutableNode, ExecutionContext, NodeError, traits::NodeInput};

/// Handler for `MANUAL_TRIGGER`: forwards the trigger payload unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManualTriggerNode;

#[async_trait]
impl ExecutableNode for ManualTriggerNode {
    async fn execute(&self, input: NodeInput) -> Result<ExecutionContext, NodeError> {
        debug!(node_id = %input.node_id, "manual trigger fired");
        Ok(input.context)
    }
}

/// Handler for `INITIAL`, the editor's placeholder node.
#[derive(Debug, Default, Clone, Copy)]
pub struct InitialNode;

#[async_trait]
impl ExecutableNode for InitialNode {
    async fn execute(&self, input: NodeInput) -> Result<ExecutionContext, NodeError> {
        Ok(input.context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn input(context: ExecutionContext) -> NodeInput {
        NodeInput { node_id: "t".into(), data: Value::Null, context }
    }

    #[tokio::test]
    async fn manual_trigger_passes_context_through() {
        let ctx = ExecutionContext::new().with("seed", json!(42));
        let out = ManualTriggerNode.execute(input(ctx.clone())).await.unwrap();
        assert_eq!(out, ctx);
    }

    #[tokio::test]
    async fn initial_node_passes_context_through() {
        let out = InitialNode.execute(input(ExecutionContext::new())).await.unwrap();
        assert!(out.is_empty());
    }
}
