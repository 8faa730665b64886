mod init_tracing;
mod request_id;
mod tracing_config;

pub use init_tracing::init_tracing;
pub use request_id::{MAX_REQUEST_ID_LEN, REQUEST_ID_HEADER, RequestId, request_id_middleware};
pub use tracing_config::{DEFAULT_FILTER, TracingConfig};
