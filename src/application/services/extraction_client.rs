use std::sync::Arc;
use std::time::Duration;

use base64::{Engine as _, engine::general_purpose};

use crate::application::ports::{ExtractionCapability, ExtractionError, ExtractionRequest};
use crate::domain::{DataPoint, ExtractionResult};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_BACKOFF: Duration = Duration::from_secs(1);
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Bounded retry with linear backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    /// Pause after the given failed attempt (1-based): `base_backoff * attempt`.
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        self.base_backoff * attempt
    }

    /// Longest time one extraction can take: every attempt runs into its
    /// timeout and every backoff pause is taken.
    pub fn worst_case_duration(&self) -> Duration {
        let attempts = self.max_attempts.max(1);
        let pauses: Duration = (1..attempts).map(|attempt| self.backoff_after(attempt)).sum();
        self.attempt_timeout * attempts + pauses
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_backoff: DEFAULT_BASE_BACKOFF,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }
}

/// Calls the extraction capability with retries. All-or-nothing: either
/// one attempt's full result set comes back, or an `Exhausted` error naming
/// the last failure.
pub struct ExtractionClient {
    capability: Arc<dyn ExtractionCapability>,
    policy: RetryPolicy,
}

impl ExtractionClient {
    pub fn new(capability: Arc<dyn ExtractionCapability>, policy: RetryPolicy) -> Self {
        Self { capability, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    #[tracing::instrument(skip_all, fields(bytes = content.len(), data_points = data_points.len()))]
    pub async fn extract(
        &self,
        content: &[u8],
        data_points: &[DataPoint],
    ) -> Result<Vec<ExtractionResult>, ExtractionError> {
        let request = ExtractionRequest {
            document_content: general_purpose::STANDARD.encode(content),
            data_points: data_points.to_vec(),
        };
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.attempt(&request).await {
                Ok(results) => {
                    tracing::debug!(attempt, results = results.len(), "Extraction succeeded");
                    return Ok(retain_requested(results, data_points));
                }
                Err(e) if attempt < max_attempts => {
                    let backoff = self.policy.backoff_after(attempt);
                    tracing::warn!(
                        error = %e,
                        attempt,
                        max_attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        "Extraction attempt failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(error = %e, attempts = attempt, "Extraction failed after all attempts");
                    return Err(ExtractionError::Exhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    });
                }
            }
        }
    }

    async fn attempt(
        &self,
        request: &ExtractionRequest,
    ) -> Result<Vec<ExtractionResult>, ExtractionError> {
        let timeout = self.policy.attempt_timeout;
        tokio::time::timeout(timeout, self.capability.extract(request))
            .await
            .map_err(|_| ExtractionError::Timeout(timeout))?
    }
}

/// Drops results nobody asked for and clamps confidences.
fn retain_requested(
    results: Vec<ExtractionResult>,
    data_points: &[DataPoint],
) -> Vec<ExtractionResult> {
    results
        .into_iter()
        .filter(|r| data_points.iter().any(|dp| dp.name == r.name))
        .map(ExtractionResult::clamped)
        .collect()
}
