mod data_point;
mod document;
mod document_id;
mod document_status;
mod extraction_event;

pub use data_point::{DataPoint, ExtractionResult};
pub use document::{Document, DocumentResults, DocumentSummary, UNKNOWN_FILENAME};
pub use document_id::DocumentId;
pub use document_status::DocumentStatus;
pub use extraction_event::{
    DATAPOINTS_SUBMITTED, DOCUMENT_UPLOADED, DataPointsSubmitted, DocumentUploaded,
    ExtractionEvent,
};
