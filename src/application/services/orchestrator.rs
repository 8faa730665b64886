use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::application::ports::EventPublisher;
use crate::application::services::{
    DocumentRegistry, EventHandler, EventHandlerError, ExtractionClient, RecordOutcome,
    RegistryError,
};
use crate::domain::{
    DataPoint, DataPointsSubmitted, DocumentId, DocumentResults, DocumentStatus, DocumentSummary,
    ExtractionEvent,
};

/// Drives the document lifecycle.
///
/// The only component that changes document status, always through the
/// registry. Broker hand-offs happen after the registry mutation and are
/// best-effort: a failed publish is logged and the mutation stands.
pub struct Orchestrator {
    registry: Arc<DocumentRegistry>,
    publisher: Arc<dyn EventPublisher>,
    extraction_client: Arc<ExtractionClient>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOutcome {
    /// Extraction ran and its outcome was written.
    Recorded(DocumentStatus),
    /// Extraction ran but the document was resubmitted meanwhile.
    Superseded,
    /// The submission was already settled; extraction did not run.
    Skipped,
}

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("document not found: {0}")]
    NotFound(DocumentId),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("registry: {0}")]
    Registry(RegistryError),
}

impl From<RegistryError> for OrchestratorError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::NotFound(id) => OrchestratorError::NotFound(id),
            other => OrchestratorError::Registry(other),
        }
    }
}

impl Orchestrator {
    pub fn new(
        registry: Arc<DocumentRegistry>,
        publisher: Arc<dyn EventPublisher>,
        extraction_client: Arc<ExtractionClient>,
    ) -> Self {
        Self {
            registry,
            publisher,
            extraction_client,
        }
    }

    pub fn registry(&self) -> &Arc<DocumentRegistry> {
        &self.registry
    }

    #[tracing::instrument(skip(self, content, data_points), fields(bytes = content.len()))]
    pub async fn upload(
        &self,
        filename: String,
        content: Bytes,
        data_points: Vec<DataPoint>,
    ) -> DocumentId {
        let document = self.registry.create(filename, content, data_points);
        tracing::info!(document_id = %document.id, "Document uploaded");

        self.publish_best_effort(&ExtractionEvent::uploaded(&document))
            .await;

        document.id
    }

    #[tracing::instrument(skip(self, data_points), fields(data_points = data_points.len()))]
    pub async fn submit_data_points(
        &self,
        id: DocumentId,
        data_points: Vec<DataPoint>,
    ) -> Result<(), OrchestratorError> {
        self.registry.get(id)?;
        validate_data_points(&data_points)?;

        let document = self.registry.set_data_points(id, data_points)?;
        tracing::info!(
            document_id = %id,
            submission = document.submission,
            "Data points submitted"
        );

        self.publish_best_effort(&ExtractionEvent::submitted(&document))
            .await;
        Ok(())
    }

    /// Runs extraction for a submitted event and records the outcome.
    ///
    /// Extraction failures end as a `failed` document, never as an error.
    /// Only an unknown document is reported back to the caller.
    pub async fn handle_submitted_event(
        &self,
        event: DataPointsSubmitted,
    ) -> Result<HandleOutcome, RegistryError> {
        let id = event.document_id;

        if !self.registry.awaits_outcome(id, event.submission)? {
            tracing::debug!(
                submission = ?event.submission,
                "Submission already settled or superseded, skipping extraction"
            );
            return Ok(HandleOutcome::Skipped);
        }

        let (results, status) = match self
            .extraction_client
            .extract(&event.content, &event.data_points)
            .await
        {
            Ok(results) => (results, DocumentStatus::Completed),
            Err(e) => {
                tracing::warn!(error = %e, "Extraction failed, marking document failed");
                (Vec::new(), DocumentStatus::Failed)
            }
        };

        match self
            .registry
            .record_outcome(id, event.submission, results, status)?
        {
            RecordOutcome::Applied => {
                tracing::info!(status = %status, "Extraction outcome recorded");
                Ok(HandleOutcome::Recorded(status))
            }
            RecordOutcome::Stale {
                status: current,
                submission,
            } => {
                tracing::debug!(
                    current_status = %current,
                    current_submission = submission,
                    "Document moved on during extraction, outcome discarded"
                );
                Ok(HandleOutcome::Superseded)
            }
        }
    }

    pub fn get_results(&self, id: DocumentId) -> Result<DocumentResults, OrchestratorError> {
        let document = self.registry.get(id)?;
        Ok(DocumentResults {
            document_id: document.id,
            status: document.status,
            results: document.results,
        })
    }

    pub fn list(&self) -> Vec<DocumentSummary> {
        self.registry.list()
    }

    async fn publish_best_effort(&self, event: &ExtractionEvent) {
        if let Err(e) = self.publisher.publish(event).await {
            tracing::warn!(
                error = %e,
                event = event.kind(),
                document_id = %event.document_id(),
                "Failed to publish event, continuing without broker hand-off"
            );
        }
    }
}

#[async_trait]
impl EventHandler for Orchestrator {
    async fn handle(&self, event: ExtractionEvent) -> Result<(), EventHandlerError> {
        match event {
            ExtractionEvent::DocumentUploaded(uploaded) => {
                tracing::info!(
                    filename = %uploaded.filename,
                    "Document uploaded, awaiting data points"
                );
                Ok(())
            }
            ExtractionEvent::DataPointsSubmitted(submitted) => {
                self.handle_submitted_event(submitted).await?;
                Ok(())
            }
        }
    }
}

fn validate_data_points(data_points: &[DataPoint]) -> Result<(), OrchestratorError> {
    if data_points.is_empty() {
        return Err(OrchestratorError::InvalidInput(
            "at least one data point is required".to_string(),
        ));
    }
    if data_points.iter().any(|dp| dp.name.trim().is_empty()) {
        return Err(OrchestratorError::InvalidInput(
            "data point names must not be blank".to_string(),
        ));
    }
    Ok(())
}
