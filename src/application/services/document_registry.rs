use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bytes::Bytes;
use chrono::Utc;

use crate::domain::{
    DataPoint, Document, DocumentId, DocumentStatus, DocumentSummary, ExtractionResult,
};

/// Volatile, process-wide store of documents and their lifecycle state.
///
/// One reader-writer lock guards the whole map. Guards are only taken inside
/// these synchronous methods, so no caller can hold one across an `.await`.
/// Reads hand out snapshots; the registry keeps the only writable copy.
#[derive(Default)]
pub struct DocumentRegistry {
    documents: RwLock<HashMap<DocumentId, Document>>,
}

/// Result of a guarded outcome write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Applied,
    /// The document moved on (finished, or resubmitted) since the outcome's
    /// submission started. Nothing was written.
    Stale {
        status: DocumentStatus,
        submission: u64,
    },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("document not found: {0}")]
    NotFound(DocumentId),
    #[error("illegal status transition {from} -> {to}")]
    InvalidTransition {
        from: DocumentStatus,
        to: DocumentStatus,
    },
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &self,
        filename: String,
        content: Bytes,
        data_points: Vec<DataPoint>,
    ) -> Document {
        let document = Document::new(filename, content, data_points);
        self.write().insert(document.id, document.clone());
        document
    }

    pub fn get(&self, id: DocumentId) -> Result<Document, RegistryError> {
        self.read()
            .get(&id)
            .cloned()
            .ok_or(RegistryError::NotFound(id))
    }

    /// Summaries of every document, oldest first.
    pub fn list(&self) -> Vec<DocumentSummary> {
        let mut summaries: Vec<DocumentSummary> =
            self.read().values().map(Document::summary).collect();
        summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        summaries
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Replaces the requested data points and starts a new submission.
    ///
    /// Forces the status to `Processing` and clears previous results.
    /// Returns a snapshot of the document after the change.
    pub fn set_data_points(
        &self,
        id: DocumentId,
        data_points: Vec<DataPoint>,
    ) -> Result<Document, RegistryError> {
        let mut documents = self.write();
        let document = documents.get_mut(&id).ok_or(RegistryError::NotFound(id))?;

        document.data_points = data_points;
        document.results.clear();
        document.submission += 1;
        document.status = DocumentStatus::Processing;
        document.updated_at = Utc::now();

        Ok(document.clone())
    }

    /// Overwrites results and status unconditionally, as long as the status
    /// change is an edge of the lifecycle graph.
    pub fn set_results(
        &self,
        id: DocumentId,
        results: Vec<ExtractionResult>,
        status: DocumentStatus,
    ) -> Result<(), RegistryError> {
        let mut documents = self.write();
        let document = documents.get_mut(&id).ok_or(RegistryError::NotFound(id))?;

        if document.status != status && !document.status.can_transition_to(status) {
            return Err(RegistryError::InvalidTransition {
                from: document.status,
                to: status,
            });
        }

        document.results = results;
        document.status = status;
        document.updated_at = Utc::now();
        Ok(())
    }

    /// Records the outcome of one extraction run.
    ///
    /// Applies only while the document is `Processing` the same submission
    /// (`None` matches any). Anything else is reported as `Stale` and left
    /// untouched, which makes redelivered events harmless.
    pub fn record_outcome(
        &self,
        id: DocumentId,
        submission: Option<u64>,
        results: Vec<ExtractionResult>,
        status: DocumentStatus,
    ) -> Result<RecordOutcome, RegistryError> {
        if !DocumentStatus::Processing.can_transition_to(status) {
            return Err(RegistryError::InvalidTransition {
                from: DocumentStatus::Processing,
                to: status,
            });
        }

        let mut documents = self.write();
        let document = documents.get_mut(&id).ok_or(RegistryError::NotFound(id))?;

        if !awaits_outcome(document, submission) {
            return Ok(RecordOutcome::Stale {
                status: document.status,
                submission: document.submission,
            });
        }

        document.results = results;
        document.status = status;
        document.updated_at = Utc::now();
        Ok(RecordOutcome::Applied)
    }

    /// Whether an outcome for `submission` would currently be accepted.
    pub fn awaits_outcome(
        &self,
        id: DocumentId,
        submission: Option<u64>,
    ) -> Result<bool, RegistryError> {
        self.read()
            .get(&id)
            .map(|document| awaits_outcome(document, submission))
            .ok_or(RegistryError::NotFound(id))
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<DocumentId, Document>> {
        self.documents.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<DocumentId, Document>> {
        self.documents.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn awaits_outcome(document: &Document, submission: Option<u64>) -> bool {
    document.status == DocumentStatus::Processing
        && submission.is_none_or(|s| s == document.submission)
}
