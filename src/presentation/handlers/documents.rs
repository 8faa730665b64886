use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use bytes::Bytes;
use serde::Serialize;

use crate::domain::{DataPoint, DocumentStatus, DocumentSummary, UNKNOWN_FILENAME};
use crate::presentation::handlers::error_response::error_response;
use crate::presentation::state::AppState;

const FILE_FIELD: &str = "file";
const DATA_POINTS_FIELD: &str = "data_points";

#[derive(Serialize)]
pub struct UploadResponse {
    pub document_id: String,
    pub status: DocumentStatus,
}

#[derive(Serialize)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentSummaryResponse>,
}

#[derive(Serialize)]
pub struct DocumentSummaryResponse {
    pub id: String,
    pub filename: String,
    pub status: DocumentStatus,
    pub created_at: String,
}

impl From<DocumentSummary> for DocumentSummaryResponse {
    fn from(summary: DocumentSummary) -> Self {
        Self {
            id: summary.id.to_string(),
            filename: summary.filename,
            status: summary.status,
            created_at: summary.created_at.to_rfc3339(),
        }
    }
}

/// `POST /api/documents` with a `file` part and an optional `data_points`
/// part holding a JSON array.
#[tracing::instrument(skip(state, multipart))]
pub async fn upload_document_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut file: Option<(String, Bytes)> = None;
    let mut data_points: Vec<DataPoint> = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read multipart");
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Failed to read multipart: {}", e),
                );
            }
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(FILE_FIELD) => {
                let filename = field.file_name().unwrap_or(UNKNOWN_FILENAME).to_string();
                match field.bytes().await {
                    Ok(data) => file = Some((filename, data)),
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to read file bytes");
                        return error_response(
                            StatusCode::BAD_REQUEST,
                            format!("Failed to read file: {}", e),
                        );
                    }
                }
            }
            Some(DATA_POINTS_FIELD) => {
                let text = match field.text().await {
                    Ok(text) => text,
                    Err(e) => {
                        return error_response(
                            StatusCode::BAD_REQUEST,
                            format!("Failed to read data points: {}", e),
                        );
                    }
                };
                if text.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<Vec<DataPoint>>(&text) {
                    Ok(parsed) => data_points = parsed,
                    Err(e) => {
                        tracing::warn!(error = %e, "Invalid data points in upload");
                        return error_response(
                            StatusCode::BAD_REQUEST,
                            format!("Invalid data points: {}", e),
                        );
                    }
                }
            }
            other => tracing::debug!(field = ?other, "Ignoring multipart field"),
        }
    }

    let Some((filename, content)) = file else {
        tracing::warn!("Upload request with no file");
        return error_response(StatusCode::BAD_REQUEST, "Missing file field");
    };

    tracing::debug!(filename = %filename, bytes = content.len(), "File data received");

    let id = state
        .orchestrator
        .upload(filename, content, data_points)
        .await;

    (
        StatusCode::OK,
        Json(UploadResponse {
            document_id: id.to_string(),
            status: DocumentStatus::Uploaded,
        }),
    )
        .into_response()
}

pub async fn list_documents_handler(State(state): State<AppState>) -> impl IntoResponse {
    let documents = state
        .orchestrator
        .list()
        .into_iter()
        .map(DocumentSummaryResponse::from)
        .collect();

    (StatusCode::OK, Json(DocumentListResponse { documents }))
}
