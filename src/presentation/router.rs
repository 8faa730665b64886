use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::handlers::{
    get_results_handler, health_handler, list_documents_handler, submit_data_points_handler,
    upload_document_handler,
};
use crate::presentation::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let upload_limit = DefaultBodyLimit::max(state.upload_limit_bytes);

    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/documents",
            post(upload_document_handler)
                .layer(upload_limit)
                .get(list_documents_handler),
        )
        .route(
            "/api/documents/{id}/datapoints",
            post(submit_data_points_handler),
        )
        .route("/api/documents/{id}/results", get(get_results_handler))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
