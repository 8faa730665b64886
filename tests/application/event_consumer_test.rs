use std::collections::VecDeque;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use docpoint::application::ports::{Delivery, EventChannelError, EventPublisher, EventSource};
use docpoint::application::services::{
    ConsumerStats, EventConsumer, EventHandler, EventHandlerError, RegistryError,
};
use docpoint::domain::{Document, DocumentId, ExtractionEvent};
use docpoint::infrastructure::messaging::in_memory_bus;

struct RecordingHandler {
    seen: Mutex<Vec<DocumentId>>,
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn handle(&self, event: ExtractionEvent) -> Result<(), EventHandlerError> {
        self.seen.lock().unwrap().push(event.document_id());
        Ok(())
    }
}

struct PanickingHandler;

#[async_trait]
impl EventHandler for PanickingHandler {
    async fn handle(&self, _event: ExtractionEvent) -> Result<(), EventHandlerError> {
        panic!("handler exploded");
    }
}

struct FailingHandler;

#[async_trait]
impl EventHandler for FailingHandler {
    async fn handle(&self, event: ExtractionEvent) -> Result<(), EventHandlerError> {
        Err(RegistryError::NotFound(event.document_id()).into())
    }
}

/// Replays a scripted sequence of reads, then closes.
struct ScriptedSource {
    script: VecDeque<Result<Bytes, EventChannelError>>,
}

struct ScriptedDelivery(Bytes);

#[async_trait]
impl Delivery for ScriptedDelivery {
    fn payload(&self) -> &[u8] {
        &self.0
    }

    async fn ack(&self) -> Result<(), EventChannelError> {
        Err(EventChannelError::AckFailed("broker gone".to_string()))
    }
}

#[async_trait]
impl EventSource for ScriptedSource {
    async fn next_delivery(&mut self) -> Option<Result<Box<dyn Delivery>, EventChannelError>> {
        let next = self.script.pop_front()?;
        Some(next.map(|payload| Box::new(ScriptedDelivery(payload)) as Box<dyn Delivery>))
    }
}

fn uploaded_event() -> ExtractionEvent {
    let document = Document::new(
        "invoice.pdf".to_string(),
        Bytes::from_static(b"%PDF"),
        Vec::new(),
    );
    ExtractionEvent::uploaded(&document)
}

fn recording_handler() -> Arc<RecordingHandler> {
    Arc::new(RecordingHandler {
        seen: Mutex::new(Vec::new()),
    })
}

#[tokio::test]
async fn given_malformed_payload_when_consumed_then_acknowledged_and_counted() {
    let (publisher, source) = in_memory_bus(8);
    let acknowledged = source.ack_counter();
    let handler = recording_handler();
    publisher
        .publish_raw(Bytes::from_static(b"not json"))
        .unwrap();
    drop(publisher);

    let stats = EventConsumer::new(Box::new(source), handler.clone(), "test")
        .run(CancellationToken::new())
        .await;

    assert_eq!(stats.malformed, 1);
    assert_eq!(stats.handled, 0);
    assert_eq!(acknowledged.load(Ordering::SeqCst), 1);
    assert!(handler.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn given_panicking_handler_when_consumed_then_loop_survives_and_acknowledges() {
    let (publisher, source) = in_memory_bus(8);
    let acknowledged = source.ack_counter();
    publisher.publish(&uploaded_event()).await.unwrap();
    publisher.publish(&uploaded_event()).await.unwrap();
    drop(publisher);

    let stats = EventConsumer::new(Box::new(source), Arc::new(PanickingHandler), "test")
        .run(CancellationToken::new())
        .await;

    assert_eq!(stats.failed, 2);
    assert_eq!(acknowledged.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn given_failing_handler_when_consumed_then_counted_failed_and_acknowledged() {
    let (publisher, source) = in_memory_bus(8);
    let acknowledged = source.ack_counter();
    publisher.publish(&uploaded_event()).await.unwrap();
    drop(publisher);

    let stats = EventConsumer::new(Box::new(source), Arc::new(FailingHandler), "test")
        .run(CancellationToken::new())
        .await;

    assert_eq!(stats.failed, 1);
    assert_eq!(acknowledged.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn given_several_events_when_consumed_then_handled_in_publish_order() {
    let (publisher, source) = in_memory_bus(8);
    let handler = recording_handler();
    let events: Vec<ExtractionEvent> = (0..3).map(|_| uploaded_event()).collect();
    for event in &events {
        publisher.publish(event).await.unwrap();
    }
    drop(publisher);

    let stats = EventConsumer::new(Box::new(source), handler.clone(), "test")
        .run(CancellationToken::new())
        .await;

    let expected: Vec<DocumentId> = events.iter().map(ExtractionEvent::document_id).collect();
    assert_eq!(*handler.seen.lock().unwrap(), expected);
    assert_eq!(stats.handled, 3);
}

#[tokio::test]
async fn given_cancelled_token_when_running_then_stops_without_pulling() {
    let (publisher, source) = in_memory_bus(8);
    let handler = recording_handler();
    publisher.publish(&uploaded_event()).await.unwrap();
    let shutdown = CancellationToken::new();
    shutdown.cancel();

    let stats = tokio::time::timeout(
        Duration::from_secs(1),
        EventConsumer::new(Box::new(source), handler.clone(), "test").run(shutdown),
    )
    .await
    .unwrap();

    assert_eq!(stats, ConsumerStats::default());
    assert!(handler.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn given_idle_subscription_when_cancelled_then_consumer_returns() {
    let (_publisher, source) = in_memory_bus(8);
    let shutdown = CancellationToken::new();
    let task = tokio::spawn(
        EventConsumer::new(Box::new(source), recording_handler(), "test").run(shutdown.clone()),
    );

    shutdown.cancel();

    let stats = tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stats.handled, 0);
}

#[tokio::test]
async fn given_receive_error_when_consuming_then_pauses_and_continues() {
    let payload = Bytes::from(uploaded_event().to_payload().unwrap());
    let source = ScriptedSource {
        script: VecDeque::from([
            Err(EventChannelError::ReceiveFailed("connection reset".to_string())),
            Ok(payload),
        ]),
    };
    let handler = recording_handler();

    let stats = EventConsumer::new(Box::new(source), handler.clone(), "test")
        .run(CancellationToken::new())
        .await;

    assert_eq!(stats.handled, 1);
    assert_eq!(stats.ack_failures, 1);
    assert_eq!(handler.seen.lock().unwrap().len(), 1);
}
