use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{EventChannelError, EventPublisher, EventSource};
use crate::application::services::RetryPolicy;
use crate::presentation::config::{BrokerProvider, BrokerSettings};

use super::in_memory_bus::in_memory_bus;
use super::nats_broker::JetStreamBroker;
use super::noop_publisher::NoopEventPublisher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    JetStream,
    InMemory,
    /// Connected and publishing, but the subscription failed: nothing is
    /// consumed.
    PublishOnly,
    /// No broker: events are dropped and nothing is consumed.
    Degraded,
}

impl ChannelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JetStream => "jetstream",
            Self::InMemory => "in-memory",
            Self::PublishOnly => "publish-only",
            Self::Degraded => "degraded",
        }
    }

    pub fn consumes(&self) -> bool {
        matches!(self, Self::JetStream | Self::InMemory)
    }
}

/// Headroom added on top of the slowest extraction before the broker
/// redelivers an unacknowledged event.
pub const ACK_WAIT_MARGIN: Duration = Duration::from_secs(30);

pub fn ack_wait_for(policy: &RetryPolicy) -> Duration {
    policy.worst_case_duration() + ACK_WAIT_MARGIN
}

/// Publisher and, when available, the consume side of the event channel.
pub struct EventChannel {
    pub publisher: Arc<dyn EventPublisher>,
    pub source: Option<Box<dyn EventSource>>,
    pub mode: ChannelMode,
}

impl EventChannel {
    pub fn degraded() -> Self {
        Self {
            publisher: Arc::new(NoopEventPublisher),
            source: None,
            mode: ChannelMode::Degraded,
        }
    }

    /// Channel over a connected broker. Without a source it only publishes.
    pub fn from_broker(
        publisher: Arc<dyn EventPublisher>,
        source: Option<Box<dyn EventSource>>,
    ) -> Self {
        let mode = if source.is_some() {
            ChannelMode::JetStream
        } else {
            ChannelMode::PublishOnly
        };
        Self {
            publisher,
            source,
            mode,
        }
    }
}

pub struct EventChannelFactory;

impl EventChannelFactory {
    /// Picks the channel variant once, at startup. Never fails: an
    /// unreachable broker yields the degraded channel. The JetStream
    /// consumer's ack wait is sized from `retry`.
    pub async fn create(settings: &BrokerSettings, retry: &RetryPolicy) -> EventChannel {
        match settings.provider {
            BrokerProvider::Disabled => {
                tracing::warn!("Broker disabled by configuration, running in degraded mode");
                EventChannel::degraded()
            }
            BrokerProvider::Memory => {
                let (publisher, source) = in_memory_bus(settings.memory_capacity);
                tracing::info!(capacity = settings.memory_capacity, "Using in-memory event bus");
                EventChannel {
                    publisher: Arc::new(publisher),
                    source: Some(Box::new(source)),
                    mode: ChannelMode::InMemory,
                }
            }
            BrokerProvider::Nats => match Self::connect_with_retry(settings).await {
                Ok(broker) => {
                    let ack_wait = ack_wait_for(retry);
                    let source = match broker.subscribe(&settings.consumer, ack_wait).await {
                        Ok(source) => {
                            tracing::info!(
                                consumer = %settings.consumer,
                                ack_wait_secs = ack_wait.as_secs(),
                                "Subscribed to JetStream"
                            );
                            Some(Box::new(source) as Box<dyn EventSource>)
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Subscription failed, publishing only");
                            None
                        }
                    };
                    EventChannel::from_broker(Arc::new(broker.publisher()), source)
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Broker unavailable, continuing without it in degraded mode"
                    );
                    EventChannel::degraded()
                }
            },
        }
    }

    async fn connect_with_retry(
        settings: &BrokerSettings,
    ) -> Result<JetStreamBroker, EventChannelError> {
        let attempts = settings.connect_attempts.max(1);
        let delay = Duration::from_secs(settings.connect_retry_delay_secs);
        let mut attempt = 1;

        loop {
            match JetStreamBroker::connect(&settings.url, &settings.stream, &settings.subject).await
            {
                Ok(broker) => return Ok(broker),
                Err(e) if attempt < attempts => {
                    tracing::warn!(
                        error = %e,
                        attempt,
                        attempts,
                        "Broker not ready, retrying in {}s",
                        delay.as_secs()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
