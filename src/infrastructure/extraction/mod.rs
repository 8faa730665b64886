mod http_extraction_capability;

pub use http_extraction_capability::{DEFAULT_ENDPOINT, HttpExtractionCapability};
