//! `api` crate: HTTP entry point for trigger events.
//!
//! Exposes:
//!   POST   /api/v1/events                   (body: TriggerEvent)
//!   POST   /api/v1/workflows/:id/execute    (body: { initialData? })
//!
//! Both run the workflow to completion and answer with the `RunResult`.

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::{routing::post, Router};
use engine::WorkflowExecutor;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

pub use error::ApiError;
pub use handlers::AppState;

/// Build the application router.
pub fn router(executor: Arc<WorkflowExecutor>) -> Router {
    Router::new()
        .route("/api/v1/events", post(handlers::events::ingest))
        .route("/api/v1/workflows/:id/execute", post(handlers::workflows::execute))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { executor })
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: &str, executor: Arc<WorkflowExecutor>) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "API server listening");
    axum::serve(listener, router(executor)).await
}
