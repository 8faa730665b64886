use async_trait::async_trait;

use super::EventChannelError;

/// A single message pulled from the broker, pending acknowledgement.
#[async_trait]
pub trait Delivery: Send + Sync {
    fn payload(&self) -> &[u8];

    async fn ack(&self) -> Result<(), EventChannelError>;
}

/// Ordered stream of deliveries for one subscription.
///
/// `None` means the subscription is closed for good.
#[async_trait]
pub trait EventSource: Send {
    async fn next_delivery(&mut self) -> Option<Result<Box<dyn Delivery>, EventChannelError>>;
}
