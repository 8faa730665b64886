use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::application::ports::{Delivery, EventChannelError, EventPublisher, EventSource};
use crate::domain::ExtractionEvent;

/// Single-process broker over a bounded channel.
///
/// Payloads are JSON-encoded exactly as they would be on a real broker, so
/// the consume loop exercises the same decoding path.
pub fn in_memory_bus(capacity: usize) -> (InMemoryEventPublisher, InMemoryEventSource) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    let acknowledged = Arc::new(AtomicU64::new(0));
    (
        InMemoryEventPublisher { sender },
        InMemoryEventSource {
            receiver,
            acknowledged,
        },
    )
}

#[derive(Clone)]
pub struct InMemoryEventPublisher {
    sender: mpsc::Sender<Bytes>,
}

impl InMemoryEventPublisher {
    /// Enqueues a raw payload. Never waits for room in the queue.
    pub fn publish_raw(&self, payload: Bytes) -> Result<(), EventChannelError> {
        self.sender.try_send(payload).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                EventChannelError::PublishFailed("in-memory queue full".to_string())
            }
            mpsc::error::TrySendError::Closed(_) => {
                EventChannelError::Unavailable("in-memory consumer dropped".to_string())
            }
        })
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(&self, event: &ExtractionEvent) -> Result<(), EventChannelError> {
        let payload = event.to_payload()?;
        self.publish_raw(Bytes::from(payload))
    }
}

pub struct InMemoryEventSource {
    receiver: mpsc::Receiver<Bytes>,
    acknowledged: Arc<AtomicU64>,
}

impl InMemoryEventSource {
    /// Shared count of acknowledged deliveries; stays valid after the source
    /// is moved into a consumer.
    pub fn ack_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.acknowledged)
    }
}

#[async_trait]
impl EventSource for InMemoryEventSource {
    async fn next_delivery(&mut self) -> Option<Result<Box<dyn Delivery>, EventChannelError>> {
        let payload = self.receiver.recv().await?;
        Some(Ok(Box::new(InMemoryDelivery {
            payload,
            acknowledged: Arc::clone(&self.acknowledged),
        })))
    }
}

struct InMemoryDelivery {
    payload: Bytes,
    acknowledged: Arc<AtomicU64>,
}

#[async_trait]
impl Delivery for InMemoryDelivery {
    fn payload(&self) -> &[u8] {
        &self.payload
    }

    async fn ack(&self) -> Result<(), EventChannelError> {
        self.acknowledged.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
