//! Maps engine failures onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use engine::EngineError;
use serde_json::json;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body could not be parsed.
    #[error("invalid request body: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Engine(err) => match err {
                EngineError::MissingWorkflowId | EngineError::InvalidInitialData(_) => {
                    StatusCode::BAD_REQUEST
                }
                EngineError::WorkflowNotFound(_) => StatusCode::NOT_FOUND,
                EngineError::InvalidGraph(_)
                | EngineError::MultipleTriggers { .. }
                | EngineError::UnknownNodeType { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                EngineError::NodeFailed { .. } => StatusCode::BAD_GATEWAY,
                EngineError::Cancelled { .. } => StatusCode::CONFLICT,
                EngineError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(%status, "request failed: {}", self);

        let body = match &self {
            Self::BadRequest(_) => json!({
                "error": self.to_string(),
                "nodeId": null,
                "retriable": false,
            }),
            Self::Engine(err) => json!({
                "error": err.to_string(),
                "nodeId": err.node_id(),
                "retriable": err.is_retriable(),
            }),
        };
        (status, Json(body)).into_response()
    }
}
