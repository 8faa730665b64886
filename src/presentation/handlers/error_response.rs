use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::services::OrchestratorError;
use crate::domain::DocumentId;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

pub fn parse_document_id(raw: &str) -> Result<DocumentId, Response> {
    raw.parse().map_err(|_| {
        error_response(
            StatusCode::BAD_REQUEST,
            format!("Invalid document ID: {}", raw),
        )
    })
}

impl IntoResponse for OrchestratorError {
    fn into_response(self) -> Response {
        match self {
            OrchestratorError::NotFound(id) => {
                error_response(StatusCode::NOT_FOUND, format!("Document not found: {}", id))
            }
            OrchestratorError::InvalidInput(message) => {
                error_response(StatusCode::BAD_REQUEST, message)
            }
            OrchestratorError::Registry(e) => {
                tracing::error!(error = %e, "Registry rejected operation");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        }
    }
}
