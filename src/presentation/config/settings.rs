use std::time::Duration;

use config::{Config, ConfigError, File};
use serde::Deserialize;

use crate::application::services::RetryPolicy;

use super::Environment;

pub const ENV_PREFIX: &str = "APP";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub broker: BrokerSettings,
    pub extraction: ExtractionSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub max_upload_mb: usize,
    pub bind_attempts: u32,
    pub bind_retry_delay_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrokerSettings {
    pub provider: BrokerProvider,
    pub url: String,
    pub stream: String,
    pub subject: String,
    pub consumer: String,
    pub connect_attempts: u32,
    pub connect_retry_delay_secs: u64,
    pub memory_capacity: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrokerProvider {
    Nats,
    Memory,
    Disabled,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionSettings {
    pub base_url: String,
    pub endpoint: String,
    pub max_attempts: u32,
    pub backoff_secs: u64,
    pub attempt_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Settings {
    /// Defaults, then `appsettings.{environment}` if present, then `APP__*`
    /// environment variables (`APP__BROKER__URL`, ...).
    pub fn load(environment: Environment) -> Result<Self, ConfigError> {
        Self::builder(environment)?.build()?.try_deserialize()
    }

    pub fn builder(
        environment: Environment,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080_i64)?
            .set_default("server.max_upload_mb", 32_i64)?
            .set_default("server.bind_attempts", 5_i64)?
            .set_default("server.bind_retry_delay_secs", 2_i64)?
            .set_default("broker.provider", "nats")?
            .set_default("broker.url", "nats://localhost:4222")?
            .set_default("broker.stream", "DOCUMENT_EVENTS")?
            .set_default("broker.subject", "document-events")?
            .set_default("broker.consumer", "extraction-worker")?
            .set_default("broker.connect_attempts", 10_i64)?
            .set_default("broker.connect_retry_delay_secs", 3_i64)?
            .set_default("broker.memory_capacity", 256_i64)?
            .set_default("extraction.base_url", "http://localhost:8000")?
            .set_default("extraction.endpoint", "/extract-datapoints")?
            .set_default("extraction.max_attempts", 3_i64)?
            .set_default("extraction.backoff_secs", 1_i64)?
            .set_default("extraction.attempt_timeout_secs", 30_i64)?
            .set_default("logging.level", "")?
            .set_default("logging.json", environment.is_production())?
            .add_source(
                File::with_name(&format!("appsettings.{}", environment.as_str()))
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            );
        Ok(builder)
    }
}

impl ServerSettings {
    pub fn upload_limit_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

impl ExtractionSettings {
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_backoff: Duration::from_secs(self.backoff_secs),
            attempt_timeout: self.attempt_timeout(),
        }
    }
}
