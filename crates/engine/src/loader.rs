//! Graph-loading collaborators: where the executor reads a workflow from.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use db::{DbError, DbPool};
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::{Connection, Node, WorkflowGraph};

/// Loads the nodes and connections of a persisted workflow.
#[async_trait]
pub trait WorkflowLoader: Send + Sync {
    /// `Ok(None)` when no workflow has this id; `Err` for storage faults.
    async fn load_workflow(&self, workflow_id: &str) -> anyhow::Result<Option<WorkflowGraph>>;
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Workflows held in memory; used by tests and the CLI's file mode.
#[derive(Default)]
pub struct InMemoryWorkflowStore {
    workflows: RwLock<HashMap<String, WorkflowGraph>>,
    loads: AtomicUsize,
}

impl InMemoryWorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `graph` under its id, replacing any previous version.
    pub async fn insert(&self, graph: WorkflowGraph) {
        self.workflows.write().await.insert(graph.id.clone(), graph);
    }

    /// Number of `load_workflow` calls served so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkflowLoader for InMemoryWorkflowStore {
    async fn load_workflow(&self, workflow_id: &str) -> anyhow::Result<Option<WorkflowGraph>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.workflows.read().await.get(workflow_id).cloned())
    }
}

// ---------------------------------------------------------------------------
// Postgres
// ---------------------------------------------------------------------------

/// Reads the `workflow`, `node` and `connection` tables.
#[derive(Clone)]
pub struct PgWorkflowLoader {
    pool: DbPool,
}

impl PgWorkflowLoader {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkflowLoader for PgWorkflowLoader {
    async fn load_workflow(&self, workflow_id: &str) -> anyhow::Result<Option<WorkflowGraph>> {
        let (workflow, node_rows, connection_rows) =
            match db::repository::workflows::load_graph(&self.pool, workflow_id).await {
                Ok(graph) => graph,
                Err(DbError::NotFound) => return Ok(None),
                Err(e) => return Err(e.into()),
            };

        debug!(
            workflow_id,
            nodes = node_rows.len(),
            connections = connection_rows.len(),
            "workflow graph loaded"
        );

        let nodes = node_rows
            .into_iter()
            .map(|row| Node::with_tag(row.id, row.node_type, row.data))
            .collect();
        let connections = connection_rows
            .into_iter()
            .map(|row| Connection::new(row.from_node_id, row.to_node_id))
            .collect();

        Ok(Some(WorkflowGraph {
            id: workflow.id,
            name: workflow.name,
            nodes,
            connections,
        }))
    }
}
