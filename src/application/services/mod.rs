mod document_registry;
mod event_consumer;
mod extraction_client;
mod orchestrator;

pub use document_registry::{DocumentRegistry, RecordOutcome, RegistryError};
pub use event_consumer::{
    ConsumerStats, EventConsumer, EventHandler, EventHandlerError, RECEIVE_ERROR_PAUSE,
};
pub use extraction_client::{
    DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_BASE_BACKOFF, DEFAULT_MAX_ATTEMPTS, ExtractionClient,
    RetryPolicy,
};
pub use orchestrator::{HandleOutcome, Orchestrator, OrchestratorError};
