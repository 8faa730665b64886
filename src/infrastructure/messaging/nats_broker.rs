use std::time::Duration;

use async_nats::jetstream::{self, consumer::AckPolicy, consumer::pull};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;

use crate::application::ports::{Delivery, EventChannelError, EventPublisher, EventSource};
use crate::domain::ExtractionEvent;

/// Connection to a NATS JetStream stream carrying document events.
pub struct JetStreamBroker {
    context: jetstream::Context,
    stream: jetstream::stream::Stream,
    subject: String,
}

impl JetStreamBroker {
    /// Connects and makes sure the stream exists, bound to `subject`.
    pub async fn connect(
        url: &str,
        stream_name: &str,
        subject: &str,
    ) -> Result<Self, EventChannelError> {
        let client = async_nats::connect(url)
            .await
            .map_err(|e| EventChannelError::Unavailable(format!("connect to {url}: {e}")))?;
        let context = jetstream::new(client);

        let stream = context
            .get_or_create_stream(jetstream::stream::Config {
                name: stream_name.to_string(),
                subjects: vec![subject.to_string()],
                ..Default::default()
            })
            .await
            .map_err(|e| {
                EventChannelError::Unavailable(format!("create stream {stream_name}: {e}"))
            })?;

        tracing::info!(url, stream = stream_name, subject, "Connected to JetStream");

        Ok(Self {
            context,
            stream,
            subject: subject.to_string(),
        })
    }

    pub fn publisher(&self) -> JetStreamPublisher {
        JetStreamPublisher {
            context: self.context.clone(),
            subject: self.subject.clone(),
        }
    }

    /// Durable pull subscription with explicit acknowledgement. Consumers
    /// sharing `consumer_name` split the stream between them. `ack_wait`
    /// must outlast the slowest handler or the server redelivers messages
    /// that are still being processed.
    pub async fn subscribe(
        &self,
        consumer_name: &str,
        ack_wait: Duration,
    ) -> Result<JetStreamSource, EventChannelError> {
        let consumer = self
            .stream
            .get_or_create_consumer(
                consumer_name,
                pull::Config {
                    durable_name: Some(consumer_name.to_string()),
                    ack_policy: AckPolicy::Explicit,
                    ack_wait,
                    filter_subject: self.subject.clone(),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| {
                EventChannelError::Unavailable(format!("create consumer {consumer_name}: {e}"))
            })?;

        let messages = consumer
            .messages()
            .await
            .map_err(|e| EventChannelError::Unavailable(format!("open message stream: {e}")))?;

        Ok(JetStreamSource {
            messages: messages
                .map(|message| message.map_err(|e| EventChannelError::ReceiveFailed(e.to_string())))
                .boxed(),
        })
    }
}

#[derive(Clone)]
pub struct JetStreamPublisher {
    context: jetstream::Context,
    subject: String,
}

#[async_trait]
impl EventPublisher for JetStreamPublisher {
    async fn publish(&self, event: &ExtractionEvent) -> Result<(), EventChannelError> {
        let payload = Bytes::from(event.to_payload()?);

        let ack = self
            .context
            .publish(self.subject.clone(), payload)
            .await
            .map_err(|e| EventChannelError::PublishFailed(e.to_string()))?;
        ack.await
            .map_err(|e| EventChannelError::PublishFailed(e.to_string()))?;

        tracing::debug!(
            event = event.kind(),
            document_id = %event.document_id(),
            subject = %self.subject,
            "Event published"
        );
        Ok(())
    }
}

pub struct JetStreamSource {
    messages: BoxStream<'static, Result<jetstream::Message, EventChannelError>>,
}

#[async_trait]
impl EventSource for JetStreamSource {
    async fn next_delivery(&mut self) -> Option<Result<Box<dyn Delivery>, EventChannelError>> {
        let next = self.messages.next().await?;
        Some(next.map(|message| Box::new(JetStreamDelivery(message)) as Box<dyn Delivery>))
    }
}

struct JetStreamDelivery(jetstream::Message);

#[async_trait]
impl Delivery for JetStreamDelivery {
    fn payload(&self) -> &[u8] {
        &self.0.message.payload
    }

    async fn ack(&self) -> Result<(), EventChannelError> {
        self.0
            .ack()
            .await
            .map_err(|e| EventChannelError::AckFailed(e.to_string()))
    }
}
