use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{DataPoint, ExtractionResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionRequest {
    /// Base64 text of the document bytes.
    pub document_content: String,
    pub data_points: Vec<DataPoint>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExtractionResponse {
    pub results: Vec<ExtractionResult>,
}

/// One attempt against the external extraction service.
#[async_trait]
pub trait ExtractionCapability: Send + Sync {
    async fn extract(
        &self,
        request: &ExtractionRequest,
    ) -> Result<Vec<ExtractionResult>, ExtractionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("extraction service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("attempt timed out after {0:?}")]
    Timeout(Duration),
    #[error("extraction failed after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<ExtractionError>,
    },
}
