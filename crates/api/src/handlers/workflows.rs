use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use engine::{RunResult, TriggerEvent};
use serde::Deserialize;
use serde_json::Value;

use super::AppState;
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteWorkflowDto {
    #[serde(default)]
    pub initial_data: Option<Value>,
}

/// `POST /api/v1/workflows/:id/execute`: manual run of one workflow.
///
/// The body is optional; when present it must be an `ExecuteWorkflowDto`.
pub async fn execute(
    Path(id): Path<String>,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<RunResult>, ApiError> {
    let dto: ExecuteWorkflowDto = if body.is_empty() {
        ExecuteWorkflowDto::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?
    };

    let mut event = TriggerEvent::new(id);
    event.initial_data = dto.initial_data;

    let result = state.executor.execute(event).await?;
    Ok(Json(result))
}
