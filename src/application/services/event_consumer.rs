use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::application::ports::{Delivery, EventSource};
use crate::application::services::RegistryError;
use crate::domain::ExtractionEvent;

/// Pause after a failed broker read before pulling again.
pub const RECEIVE_ERROR_PAUSE: Duration = Duration::from_secs(1);

#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: ExtractionEvent) -> Result<(), EventHandlerError>;
}

#[derive(Debug, thiserror::Error)]
pub enum EventHandlerError {
    #[error("registry: {0}")]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    pub handled: u64,
    pub failed: u64,
    pub malformed: u64,
    pub ack_failures: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeliveryOutcome {
    Handled,
    Failed,
    Malformed,
}

impl ConsumerStats {
    fn record(&mut self, outcome: DeliveryOutcome, acked: bool) {
        match outcome {
            DeliveryOutcome::Handled => self.handled += 1,
            DeliveryOutcome::Failed => self.failed += 1,
            DeliveryOutcome::Malformed => self.malformed += 1,
        }
        if !acked {
            self.ack_failures += 1;
        }
    }
}

/// Consume loop for one subscription.
///
/// Deliveries are processed one at a time, in order. Every delivery is
/// acknowledged once processing ends, whether the handler succeeded, failed,
/// panicked, or the payload could not be decoded. Failures surface through
/// document status instead of broker redelivery.
pub struct EventConsumer {
    source: Box<dyn EventSource>,
    handler: Arc<dyn EventHandler>,
    subscription: String,
}

impl EventConsumer {
    pub fn new(
        source: Box<dyn EventSource>,
        handler: Arc<dyn EventHandler>,
        subscription: impl Into<String>,
    ) -> Self {
        Self {
            source,
            handler,
            subscription: subscription.into(),
        }
    }

    /// Runs until `shutdown` is cancelled or the source closes. An event
    /// already being handled when cancellation arrives is finished and
    /// acknowledged; no further deliveries are pulled.
    pub async fn run(mut self, shutdown: CancellationToken) -> ConsumerStats {
        tracing::info!(subscription = %self.subscription, "Event consumer started");
        let mut stats = ConsumerStats::default();

        loop {
            let next = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                next = self.source.next_delivery() => next,
            };

            match next {
                Some(Ok(delivery)) => {
                    let (outcome, acked) =
                        process(self.handler.as_ref(), delivery.as_ref()).await;
                    stats.record(outcome, acked);
                }
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Failed to receive event");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(RECEIVE_ERROR_PAUSE) => {}
                    }
                }
                None => {
                    tracing::info!("Subscription closed");
                    break;
                }
            }
        }

        tracing::info!(
            subscription = %self.subscription,
            handled = stats.handled,
            failed = stats.failed,
            malformed = stats.malformed,
            ack_failures = stats.ack_failures,
            "Event consumer stopped"
        );
        stats
    }
}

async fn process(handler: &dyn EventHandler, delivery: &dyn Delivery) -> (DeliveryOutcome, bool) {
    let outcome = match ExtractionEvent::from_payload(delivery.payload()) {
        Ok(event) => dispatch(handler, event).await,
        Err(e) => {
            tracing::warn!(
                error = %e,
                bytes = delivery.payload().len(),
                "Malformed event, acknowledging without handling"
            );
            DeliveryOutcome::Malformed
        }
    };

    let acked = match delivery.ack().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to acknowledge event");
            false
        }
    };

    (outcome, acked)
}

async fn dispatch(handler: &dyn EventHandler, event: ExtractionEvent) -> DeliveryOutcome {
    let span = tracing::info_span!(
        "extraction_event",
        event = event.kind(),
        document_id = %event.document_id(),
    );

    async move {
        match AssertUnwindSafe(handler.handle(event)).catch_unwind().await {
            Ok(Ok(())) => DeliveryOutcome::Handled,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Event handler failed");
                DeliveryOutcome::Failed
            }
            Err(panic) => {
                tracing::error!(
                    panic = %panic_message(panic.as_ref()),
                    "Event handler panicked"
                );
                DeliveryOutcome::Failed
            }
        }
    }
    .instrument(span)
    .await
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
