use async_trait::async_trait;

use crate::domain::ExtractionEvent;

use super::EventChannelError;

/// Best-effort hand-off of events to the broker.
///
/// Implementations must be safe for concurrent callers and must not block
/// indefinitely when the broker is unavailable.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &ExtractionEvent) -> Result<(), EventChannelError>;
}
