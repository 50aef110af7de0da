//! Node-level error type.

use thiserror::Error;

/// Errors returned by a node's `execute` method.
///
/// Each node type decides which variant a failure maps to:
/// - `Retryable`: the step runner may re-run the node with back-off.
/// - `Fatal`: the run is aborted at this node, no retry is attempted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// Transient failure; re-running the node may succeed.
    #[error("retryable node error: {0}")]
    Retryable(String),

    /// Permanent failure; no retry should be attempted.
    #[error("fatal node error: {0}")]
    Fatal(String),
}

impl NodeError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable(_))
    }
}
