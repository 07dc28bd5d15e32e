// --- File: crates/autoservice_booking/src/submission.rs ---
//! Sending a booking with a per-attempt timeout and bounded retries.

use std::time::Duration;
use tracing::{error, info, warn};

use autoservice_common::logging::mask_phone;
use autoservice_common::models::BookingRequest;
use autoservice_common::{BackendError, BookingBackend};
use autoservice_config::models::SubmissionConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitPolicy {
    pub timeout: Duration,
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for SubmitPolicy {
    fn default() -> Self {
        Self::from_config(&SubmissionConfig::default())
    }
}

impl SubmitPolicy {
    pub fn from_config(config: &SubmissionConfig) -> Self {
        Self {
            timeout: config.timeout(),
            max_attempts: config.max_attempts.max(1),
            initial_backoff: config.backoff(),
        }
    }

    /// Delay before attempt `attempt + 1` (attempts counted from 1).
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor)
    }
}

/// Sends `request`, retrying transport failures, timeouts and 5xx answers.
///
/// A rejection by the backend ends the submission immediately. Every attempt carries the
/// same `requestId`, so a backend that deduplicates will not record the booking twice.
pub async fn send_with_retry<B: BookingBackend + ?Sized>(
    backend: &B,
    request: &BookingRequest,
    policy: &SubmitPolicy,
) -> Result<Option<String>, BackendError> {
    let mut attempt = 1;
    loop {
        let outcome = match tokio::time::timeout(policy.timeout, backend.submit_booking(request)).await
        {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout(policy.timeout)),
        };

        match outcome {
            Ok(message) => {
                info!(
                    request_id = %request.request_id,
                    phone = %mask_phone(&request.phone),
                    "booking for {} {} accepted on attempt {}",
                    request.date,
                    request.time.map(|t| t.to_string()).unwrap_or_default(),
                    attempt
                );
                return Ok(message);
            }
            Err(err) if err.is_retryable() && attempt < policy.max_attempts => {
                let delay = policy.backoff_after(attempt);
                warn!(
                    request_id = %request.request_id,
                    "booking attempt {}/{} failed: {}; retrying in {:?}",
                    attempt,
                    policy.max_attempts,
                    err,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                error!(
                    request_id = %request.request_id,
                    "booking failed after {} attempt(s): {}",
                    attempt,
                    err
                );
                return Err(err);
            }
        }
    }
}
