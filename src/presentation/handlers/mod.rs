mod data_points;
mod documents;
mod error_response;
mod health;
mod results;

pub use data_points::submit_data_points_handler;
pub use documents::{list_documents_handler, upload_document_handler};
pub use error_response::ErrorResponse;
pub use health::health_handler;
pub use results::get_results_handler;
