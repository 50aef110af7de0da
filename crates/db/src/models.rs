//! Row structs that map 1-to-1 onto database tables.
//!
//! These are *persistence* models: they carry no domain behaviour.
//! Domain types live in the `engine` crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// workflow
// ---------------------------------------------------------------------------

/// A persisted workflow row. Only the columns the engine needs.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkflowRow {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// node
// ---------------------------------------------------------------------------

/// A persisted graph vertex.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NodeRow {
    pub id: String,
    pub workflow_id: String,
    /// Raw node type tag (`MANUAL_TRIGGER`, `HTTP_REQUEST`, …).
    #[sqlx(rename = "type")]
    pub node_type: String,
    /// Type-specific configuration.
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// connection
// ---------------------------------------------------------------------------

/// A persisted directed edge: `to_node_id` depends on `from_node_id`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConnectionRow {
    pub id: String,
    pub workflow_id: String,
    pub from_node_id: String,
    pub to_node_id: String,
}
