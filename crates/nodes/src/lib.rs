//! `nodes` crate: the `ExecutableNode` trait and built-in node implementations.
//!
//! Every node type tag in [`NodeType`] has exactly one handler here. The
//! engine crate resolves a handler per tag and dispatches through the trait
//! object, threading an [`ExecutionContext`] from node to node.

pub mod context;
pub mod error;
pub mod http_request;
pub mod kind;
pub mod mock;
pub mod traits;
pub mod trigger;

pub use context::ExecutionContext;
pub use error::NodeError;
pub use http_request::{HttpRequestConfig, HttpRequestNode};
pub use kind::NodeType;
pub use traits::{ExecutableNode, NodeInput};
pub use trigger::{InitialNode, ManualTriggerNode};
