//! Read access to a workflow graph.

use sqlx::PgPool;

use crate::{
    DbError,
    models::{ConnectionRow, NodeRow, WorkflowRow},
};

/// Fetch a single workflow by its primary key.
pub async fn get_workflow(pool: &PgPool, id: &str) -> Result<WorkflowRow, DbError> {
    let row = sqlx::query_as::<_, WorkflowRow>(
        r#"SELECT id, name, created_at FROM workflow WHERE id = $1"#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// All nodes of a workflow in the order they were added.
///
/// The order is part of the contract: the engine breaks ties between
/// equally-ready nodes by it, so it must be stable across reads.
pub async fn list_nodes(pool: &PgPool, workflow_id: &str) -> Result<Vec<NodeRow>, DbError> {
    let rows = sqlx::query_as::<_, NodeRow>(
        r#"
        SELECT id, workflow_id, type, data, created_at
        FROM node
        WHERE workflow_id = $1
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(workflow_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// All connections of a workflow.
pub async fn list_connections(
    pool: &PgPool,
    workflow_id: &str,
) -> Result<Vec<ConnectionRow>, DbError> {
    let rows = sqlx::query_as::<_, ConnectionRow>(
        r#"
        SELECT id, workflow_id, from_node_id, to_node_id
        FROM connection
        WHERE workflow_id = $1
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(workflow_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Load a workflow together with its nodes and connections.
///
/// Returns `DbError::NotFound` when no workflow has this id.
pub async fn load_graph(
    pool: &PgPool,
    workflow_id: &str,
) -> Result<(WorkflowRow, Vec<NodeRow>, Vec<ConnectionRow>), DbError> {
    let workflow = get_workflow(pool, workflow_id).await?;
    let nodes = list_nodes(pool, workflow_id).await?;
    let connections = list_connections(pool, workflow_id).await?;
    Ok((workflow, nodes, connections))
}
