//! Request handlers. Each one turns a request into a `TriggerEvent` and
//! runs it to completion on the shared executor.

use std::sync::Arc;

use engine::WorkflowExecutor;

pub mod events;
pub mod workflows;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<WorkflowExecutor>,
}
