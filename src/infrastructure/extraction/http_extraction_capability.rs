use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::application::ports::{
    ExtractionCapability, ExtractionError, ExtractionRequest, ExtractionResponse,
};
use crate::domain::ExtractionResult;

pub const DEFAULT_ENDPOINT: &str = "/extract-datapoints";

/// Single-attempt HTTP call to the extraction service. Retries belong to
/// `ExtractionClient`.
pub struct HttpExtractionCapability {
    client: Client,
    url: String,
    timeout: Duration,
}

impl HttpExtractionCapability {
    pub fn new(base_url: &str, endpoint: &str, timeout: Duration) -> Result<Self, ExtractionError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExtractionError::Transport(format!("http client build failed: {e}")))?;
        Ok(Self {
            client,
            url: format!("{}{}", base_url.trim_end_matches('/'), endpoint),
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ExtractionCapability for HttpExtractionCapability {
    async fn extract(
        &self,
        request: &ExtractionRequest,
    ) -> Result<Vec<ExtractionResult>, ExtractionError> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExtractionError::Timeout(self.timeout)
                } else {
                    ExtractionError::Transport(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: ExtractionResponse = response
            .json()
            .await
            .map_err(|e| ExtractionError::MalformedResponse(e.to_string()))?;

        Ok(body.results)
    }
}
