use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use crate::domain::{DataPoint, DocumentStatus};
use crate::presentation::handlers::error_response::{error_response, parse_document_id};
use crate::presentation::state::AppState;

#[derive(Deserialize)]
pub struct SubmitDataPointsRequest {
    pub data_points: Vec<DataPoint>,
}

#[derive(Serialize)]
pub struct SubmitDataPointsResponse {
    pub document_id: String,
    pub status: DocumentStatus,
}

#[tracing::instrument(skip(state, payload))]
pub async fn submit_data_points_handler(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
    payload: Result<Json<SubmitDataPointsRequest>, JsonRejection>,
) -> impl IntoResponse {
    let id = match parse_document_id(&document_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let Json(request) = match payload {
        Ok(request) => request,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "Invalid data points body");
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid request body: {}", rejection.body_text()),
            );
        }
    };

    match state
        .orchestrator
        .submit_data_points(id, request.data_points)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(SubmitDataPointsResponse {
                document_id: id.to_string(),
                status: DocumentStatus::Processing,
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
