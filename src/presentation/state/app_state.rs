use std::sync::Arc;

use crate::application::services::Orchestrator;
use crate::infrastructure::messaging::ChannelMode;

pub const DEFAULT_UPLOAD_LIMIT_BYTES: usize = 32 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub channel_mode: ChannelMode,
    pub upload_limit_bytes: usize,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, channel_mode: ChannelMode) -> Self {
        Self {
            orchestrator,
            channel_mode,
            upload_limit_bytes: DEFAULT_UPLOAD_LIMIT_BYTES,
        }
    }

    pub fn with_upload_limit(mut self, bytes: usize) -> Self {
        self.upload_limit_bytes = bytes;
        self
    }
}
