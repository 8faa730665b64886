use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::{DataPoint, Document, DocumentId};

pub const DOCUMENT_UPLOADED: &str = "document.uploaded";
pub const DATAPOINTS_SUBMITTED: &str = "datapoints.submitted";

/// Payload crossing the broker boundary.
///
/// Each event carries its own content snapshot so consumers never read the
/// document back before acting on it. On the wire the kind is the `event`
/// field and the content is base64 text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum ExtractionEvent {
    #[serde(rename = "document.uploaded")]
    DocumentUploaded(DocumentUploaded),
    #[serde(rename = "datapoints.submitted")]
    DataPointsSubmitted(DataPointsSubmitted),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentUploaded {
    pub document_id: DocumentId,
    pub filename: String,
    #[serde(rename = "document_content", with = "base64_content")]
    pub content: Bytes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPointsSubmitted {
    pub document_id: DocumentId,
    pub filename: String,
    #[serde(rename = "document_content", with = "base64_content")]
    pub content: Bytes,
    pub data_points: Vec<DataPoint>,
    /// Submission counter of the document when the event was published.
    /// Events without it apply to whatever submission is in flight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission: Option<u64>,
}

impl ExtractionEvent {
    pub fn uploaded(document: &Document) -> Self {
        Self::DocumentUploaded(DocumentUploaded {
            document_id: document.id,
            filename: document.filename.clone(),
            content: document.content.clone(),
        })
    }

    pub fn submitted(document: &Document) -> Self {
        Self::DataPointsSubmitted(DataPointsSubmitted {
            document_id: document.id,
            filename: document.filename.clone(),
            content: document.content.clone(),
            data_points: document.data_points.clone(),
            submission: Some(document.submission),
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::DocumentUploaded(_) => DOCUMENT_UPLOADED,
            Self::DataPointsSubmitted(_) => DATAPOINTS_SUBMITTED,
        }
    }

    pub fn document_id(&self) -> DocumentId {
        match self {
            Self::DocumentUploaded(e) => e.document_id,
            Self::DataPointsSubmitted(e) => e.document_id,
        }
    }

    pub fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_payload(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }
}

mod base64_content {
    use base64::{Engine as _, engine::general_purpose};
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(content: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&general_purpose::STANDARD.encode(content))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}
