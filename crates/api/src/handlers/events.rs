use axum::{extract::State, Json};
use engine::{RunResult, TriggerEvent};
use tracing::info;

use super::AppState;
use crate::error::ApiError;

/// `POST /api/v1/events`: the raw trigger event entry point.
pub async fn ingest(
    State(state): State<AppState>,
    Json(event): Json<TriggerEvent>,
) -> Result<Json<RunResult>, ApiError> {
    info!(workflow_id = ?event.workflow_id, event_id = ?event.id, "trigger event received");
    let result = state.executor.execute(event).await?;
    Ok(Json(result))
}
