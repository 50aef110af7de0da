//! `engine` crate: workflow graph model, topological ordering, executor
//! registry and the execution engine.

pub mod models;
pub mod error;
pub mod dag;
pub mod registry;
pub mod loader;
pub mod step;
pub mod executor;

pub use models::{Connection, Node, RunResult, TriggerEvent, WorkflowGraph};
pub use error::{EngineError, GraphError};
pub use dag::{topological_sort, validate_dag};
pub use registry::ExecutorRegistry;
pub use loader::{InMemoryWorkflowStore, PgWorkflowLoader, WorkflowLoader};
pub use step::{LocalStepRunner, RetryConfig, StepRunner};
pub use executor::{RunState, WorkflowExecutor};
