mod event_channel_factory;
mod in_memory_bus;
mod nats_broker;
mod noop_publisher;

pub use event_channel_factory::{
    ACK_WAIT_MARGIN, ChannelMode, EventChannel, EventChannelFactory, ack_wait_for,
};
pub use in_memory_bus::{InMemoryEventPublisher, InMemoryEventSource, in_memory_bus};
pub use nats_broker::{JetStreamBroker, JetStreamPublisher, JetStreamSource};
pub use noop_publisher::NoopEventPublisher;
