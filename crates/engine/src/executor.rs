//! Workflow execution engine.
//!
//! `WorkflowExecutor` is the central orchestrator:
//! 1. Loads the workflow graph through a [`WorkflowLoader`].
//! 2. Sorts it topologically and resolves every node's handler up front,
//!    so an invalid definition fails before any node runs.
//! 3. Iterates the order, running each node as a durable step and handing
//!    the returned context to the next node.
//! 4. Returns the execution order and the final context.
//!
//! Handler failures are not reinterpreted here: retry policy belongs to the
//! [`StepRunner`], and whatever it finally surfaces is tagged with the
//! failing node's id and the context that node received.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use nodes::{ExecutableNode, ExecutionContext, NodeInput, NodeType};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn, Span};
use uuid::Uuid;

use crate::dag::topological_sort;
use crate::loader::WorkflowLoader;
use crate::models::{Node, RunResult, TriggerEvent};
use crate::registry::ExecutorRegistry;
use crate::step::{StepFuture, StepRunner};
use crate::EngineError;

// ---------------------------------------------------------------------------
// Run state
// ---------------------------------------------------------------------------

/// Lifecycle of a single run. Transitions only move forward:
/// `Loaded → Sorted → Running(0) → … → Running(n-1) → Completed`, or
/// `Running(i) → Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Loaded,
    Sorted,
    Running { index: usize, node_id: String },
    Completed,
    Failed { node_id: String },
}

/// Callback notified on every state transition of every run.
pub type StateObserver = Arc<dyn Fn(&str, &RunState) + Send + Sync>;

// ---------------------------------------------------------------------------
// WorkflowExecutor
// ---------------------------------------------------------------------------

/// Orchestrates workflow runs.
///
/// Holds no per-run state, so one executor behind an `Arc` serves any
/// number of concurrent runs.
pub struct WorkflowExecutor {
    loader: Arc<dyn WorkflowLoader>,
    registry: Arc<ExecutorRegistry>,
    steps: Arc<dyn StepRunner>,
    observer: Option<StateObserver>,
}

impl WorkflowExecutor {
    /// Create a new executor.
    pub fn new(
        loader: Arc<dyn WorkflowLoader>,
        registry: Arc<ExecutorRegistry>,
        steps: Arc<dyn StepRunner>,
    ) -> Self {
        Self { loader, registry, steps, observer: None }
    }

    /// Attach an observer for run state transitions.
    pub fn with_state_observer(mut self, observer: StateObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Run the workflow named by `event` to completion.
    pub async fn execute(&self, event: TriggerEvent) -> Result<RunResult, EngineError> {
        self.execute_with_cancel(event, CancellationToken::new()).await
    }

    /// Run the workflow, checking `cancel` before each node.
    ///
    /// A node already in flight is never interrupted; cancellation takes
    /// effect at the next node boundary.
    ///
    /// # Errors
    /// Definition errors (`MissingWorkflowId`, `WorkflowNotFound`,
    /// `InvalidGraph`, `MultipleTriggers`, `UnknownNodeType`) abort the run
    /// before any node executes. `NodeFailed` and `Cancelled` abort it at
    /// the current node, leaving earlier nodes' side effects in place.
    #[instrument(
        skip_all,
        fields(workflow_id = tracing::field::Empty, run_id = tracing::field::Empty)
    )]
    pub async fn execute_with_cancel(
        &self,
        event: TriggerEvent,
        cancel: CancellationToken,
    ) -> Result<RunResult, EngineError> {
        let workflow_id = event
            .workflow_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(EngineError::MissingWorkflowId)?
            .to_owned();
        // Event ids are only unique per workflow.
        let run_id = match event.id.as_deref() {
            Some(id) => format!("{workflow_id}:{id}"),
            None => Uuid::new_v4().to_string(),
        };

        let span = Span::current();
        span.record("workflow_id", workflow_id.as_str());
        span.record("run_id", run_id.as_str());

        // ------------------------------------------------------------------
        // Load the graph.
        // ------------------------------------------------------------------
        let graph = self
            .loader
            .load_workflow(&workflow_id)
            .await
            .map_err(|source| EngineError::Storage {
                workflow_id: workflow_id.clone(),
                source,
            })?
            .ok_or_else(|| EngineError::WorkflowNotFound(workflow_id.clone()))?;
        self.transition(&run_id, RunState::Loaded);

        // ------------------------------------------------------------------
        // Sort, validate and resolve every handler before running anything.
        // ------------------------------------------------------------------
        let order = topological_sort(&graph.nodes, &graph.connections)?;
        ensure_single_triggers(&order)?;

        let plan = order
            .into_iter()
            .map(|node| {
                let handler = self.registry.resolve(&node.node_type).map_err(|e| {
                    EngineError::UnknownNodeType {
                        node_id: node.id.clone(),
                        node_type: e.0,
                    }
                })?;
                Ok((node, handler))
            })
            .collect::<Result<Vec<_>, EngineError>>()?;

        let order_ids: Vec<String> = plan.iter().map(|(node, _)| node.id.clone()).collect();
        self.transition(&run_id, RunState::Sorted);
        info!(
            "graph sorted, executing {} nodes in order: {:?}",
            order_ids.len(), order_ids
        );

        // ------------------------------------------------------------------
        // Execute nodes sequentially.
        // ------------------------------------------------------------------
        let mut context = ExecutionContext::from_payload(event.initial_data.unwrap_or(Value::Null))
            .map_err(|e| EngineError::InvalidInitialData(e.to_string()))?;

        for (index, (node, handler)) in plan.iter().enumerate() {
            let step = if cancel.is_cancelled() {
                warn!(node_id = %node.id, "run cancelled");
                Err(EngineError::Cancelled { node_id: node.id.clone() })
            } else {
                self.transition(&run_id, RunState::Running { index, node_id: node.id.clone() });
                self.run_node(&run_id, node, handler, context).await
            };

            context = match step {
                Ok(next) => next,
                Err(err) => {
                    self.transition(&run_id, RunState::Failed { node_id: node.id.clone() });
                    // Keep the journal only for runs a redelivery can still finish.
                    if !err.is_retriable() {
                        self.steps.finish_run(&run_id).await;
                    }
                    return Err(err);
                }
            };
        }

        self.steps.finish_run(&run_id).await;
        self.transition(&run_id, RunState::Completed);
        info!("workflow '{}' run {} completed", workflow_id, run_id);

        Ok(RunResult {
            run_id,
            order: order_ids,
            result: context,
        })
    }

    // -----------------------------------------------------------------------
    // Internal: one node as one durable step.
    // -----------------------------------------------------------------------

    async fn run_node(
        &self,
        run_id: &str,
        node: &Node,
        handler: &Arc<dyn ExecutableNode>,
        context: ExecutionContext,
    ) -> Result<ExecutionContext, EngineError> {
        let step_id = step_id(node);

        // Every attempt gets its own copy of the input.
        let work = {
            let handler = handler.clone();
            let node_id = node.id.clone();
            let data = node.data.clone();
            let context = context.clone();
            move || -> StepFuture {
                let handler = handler.clone();
                let input = NodeInput {
                    node_id: node_id.clone(),
                    data: data.clone(),
                    context: context.clone(),
                };
                Box::pin(async move { handler.execute(input).await.map(ExecutionContext::into_value) })
            }
        };

        let outcome = self
            .steps
            .run(run_id, &step_id, &work)
            .await
            .and_then(ExecutionContext::from_payload);

        match outcome {
            Ok(next) => {
                debug!(node_id = %node.id, keys = next.len(), "node succeeded");
                Ok(next)
            }
            Err(source) => {
                error!(node_id = %node.id, "node failed: {}", source);
                Err(EngineError::NodeFailed {
                    node_id: node.id.clone(),
                    context,
                    source,
                })
            }
        }
    }

    fn transition(&self, run_id: &str, state: RunState) {
        debug!(run_id, ?state, "run state");
        if let Some(observer) = &self.observer {
            observer(run_id, &state);
        }
    }
}

/// Step id for a node. Includes a fingerprint of the node's type and data
/// so an edited node is not replayed from a stale journal entry.
fn step_id(node: &Node) -> String {
    let mut hasher = DefaultHasher::new();
    node.node_type.hash(&mut hasher);
    node.data.to_string().hash(&mut hasher);
    format!("node:{}:{:016x}", node.id, hasher.finish())
}

/// A workflow may hold at most one manual trigger and one initial node.
fn ensure_single_triggers(nodes: &[Node]) -> Result<(), EngineError> {
    for kind in [NodeType::ManualTrigger, NodeType::Initial] {
        let node_ids: Vec<String> = nodes
            .iter()
            .filter(|n| n.kind() == Some(kind))
            .map(|n| n.id.clone())
            .collect();

        if node_ids.len() > 1 {
            return Err(EngineError::MultipleTriggers {
                node_type: kind.to_string(),
                node_ids,
            });
        }
    }
    Ok(())
}
