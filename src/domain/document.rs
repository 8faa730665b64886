use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{DataPoint, DocumentId, DocumentStatus, ExtractionResult};

pub const UNKNOWN_FILENAME: &str = "unknown";

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub filename: String,
    pub content: Bytes,
    pub data_points: Vec<DataPoint>,
    pub results: Vec<ExtractionResult>,
    pub status: DocumentStatus,
    /// Number of data-point submissions so far. Zero until the first one.
    pub submission: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(filename: String, content: Bytes, data_points: Vec<DataPoint>) -> Self {
        let now = Utc::now();
        let filename = if filename.trim().is_empty() {
            UNKNOWN_FILENAME.to_string()
        } else {
            filename
        };
        Self {
            id: DocumentId::new(),
            filename,
            content,
            data_points,
            results: Vec::new(),
            status: DocumentStatus::Uploaded,
            submission: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id,
            filename: self.filename.clone(),
            status: self.status,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    pub id: DocumentId,
    pub filename: String,
    pub status: DocumentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentResults {
    pub document_id: DocumentId,
    pub status: DocumentStatus,
    pub results: Vec<ExtractionResult>,
}
