use std::sync::Arc;
use std::time::Duration;

use docpoint::application::services::RetryPolicy;
use docpoint::infrastructure::messaging::{
    ACK_WAIT_MARGIN, ChannelMode, EventChannel, EventChannelFactory, NoopEventPublisher,
    ack_wait_for, in_memory_bus,
};
use docpoint::presentation::config::{BrokerProvider, BrokerSettings};

fn broker_settings(provider: BrokerProvider) -> BrokerSettings {
    BrokerSettings {
        provider,
        url: "nats://127.0.0.1:1".to_string(),
        stream: "DOCUMENT_EVENTS".to_string(),
        subject: "document-events".to_string(),
        consumer: "extraction-worker".to_string(),
        connect_attempts: 1,
        connect_retry_delay_secs: 0,
        memory_capacity: 8,
    }
}

#[tokio::test]
async fn given_disabled_provider_when_creating_channel_then_degraded_without_source() {
    let channel = EventChannelFactory::create(
        &broker_settings(BrokerProvider::Disabled),
        &RetryPolicy::default(),
    )
    .await;

    assert_eq!(channel.mode, ChannelMode::Degraded);
    assert!(channel.source.is_none());
}

#[tokio::test]
async fn given_memory_provider_when_creating_channel_then_in_memory_with_source() {
    let channel = EventChannelFactory::create(
        &broker_settings(BrokerProvider::Memory),
        &RetryPolicy::default(),
    )
    .await;

    assert_eq!(channel.mode, ChannelMode::InMemory);
    assert!(channel.source.is_some());
}

#[tokio::test]
async fn given_unreachable_nats_when_creating_channel_then_falls_back_to_degraded() {
    let channel = EventChannelFactory::create(
        &broker_settings(BrokerProvider::Nats),
        &RetryPolicy::default(),
    )
    .await;

    assert_eq!(channel.mode, ChannelMode::Degraded);
    assert!(channel.source.is_none());
}

#[test]
fn given_broker_without_subscription_when_building_channel_then_publish_only() {
    let channel = EventChannel::from_broker(Arc::new(NoopEventPublisher), None);

    assert_eq!(channel.mode, ChannelMode::PublishOnly);
    assert_eq!(channel.mode.as_str(), "publish-only");
    assert!(!channel.mode.consumes());
    assert!(channel.source.is_none());
}

#[test]
fn given_broker_with_subscription_when_building_channel_then_jetstream() {
    let (_, source) = in_memory_bus(1);

    let channel = EventChannel::from_broker(Arc::new(NoopEventPublisher), Some(Box::new(source)));

    assert_eq!(channel.mode, ChannelMode::JetStream);
    assert!(channel.mode.consumes());
}

#[test]
fn given_default_retry_policy_when_sizing_ack_wait_then_outlasts_slowest_extraction() {
    let policy = RetryPolicy::default();

    let ack_wait = ack_wait_for(&policy);

    assert_eq!(ack_wait, Duration::from_secs(93) + ACK_WAIT_MARGIN);
    assert!(ack_wait > policy.attempt_timeout * policy.max_attempts);
}
