#[derive(Debug, thiserror::Error)]
pub enum EventChannelError {
    #[error("broker unavailable: {0}")]
    Unavailable(String),
    #[error("publish failed: {0}")]
    PublishFailed(String),
    #[error("receive failed: {0}")]
    ReceiveFailed(String),
    #[error("acknowledge failed: {0}")]
    AckFailed(String),
    #[error("encoding: {0}")]
    Encoding(#[from] serde_json::Error),
}
