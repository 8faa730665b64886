use async_trait::async_trait;

use crate::application::ports::{EventChannelError, EventPublisher};
use crate::domain::ExtractionEvent;

/// Degraded-mode publisher: accepts every event, drops it, reports success.
pub struct NoopEventPublisher;

#[async_trait]
impl EventPublisher for NoopEventPublisher {
    async fn publish(&self, event: &ExtractionEvent) -> Result<(), EventChannelError> {
        tracing::debug!(
            event = event.kind(),
            document_id = %event.document_id(),
            "Broker not connected, dropping event"
        );
        Ok(())
    }
}
