use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::domain::{DocumentStatus, ExtractionResult};
use crate::presentation::handlers::error_response::parse_document_id;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct ResultsResponse {
    pub document_id: String,
    pub status: DocumentStatus,
    pub results: Vec<ExtractionResult>,
}

#[tracing::instrument(skip(state))]
pub async fn get_results_handler(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
) -> impl IntoResponse {
    let id = match parse_document_id(&document_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.orchestrator.get_results(id) {
        Ok(results) => (
            StatusCode::OK,
            Json(ResultsResponse {
                document_id: results.document_id.to_string(),
                status: results.status,
                results: results.results,
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
