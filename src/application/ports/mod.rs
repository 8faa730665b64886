mod event_channel_error;
mod event_publisher;
mod event_source;
mod extraction_capability;

pub use event_channel_error::EventChannelError;
pub use event_publisher::EventPublisher;
pub use event_source::{Delivery, EventSource};
pub use extraction_capability::{
    ExtractionCapability, ExtractionError, ExtractionRequest, ExtractionResponse,
};
