mod environment;
mod settings;

pub use environment::{ENVIRONMENT_VAR, Environment};
pub use settings::{
    BrokerProvider, BrokerSettings, ENV_PREFIX, ExtractionSettings, LoggingSettings,
    ServerSettings, Settings,
};
