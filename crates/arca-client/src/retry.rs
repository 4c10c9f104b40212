//! Backoff for idempotent HTTP calls.
//!
//! A transport failure (refused connection, timeout, reset) is retried; a
//! response of any status is handed back untouched for the caller to
//! check.

use std::future::Future;
use std::time::Duration;

/// How many times, and how patiently, to retry a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each one after.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    /// Three retries, waiting 200ms, 400ms, then 800ms.
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// A policy that sends once.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Wait before retry number `retry` (zero-based).
    pub fn delay(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retry))
    }
}

pub(crate) async fn retry_send<F, Fut>(
    policy: &RetryPolicy,
    endpoint: &str,
    send: F,
) -> Result<reqwest::Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let mut retry = 0;
    loop {
        match send().await {
            Ok(resp) => return Ok(resp),
            Err(e) if retry < policy.max_retries => {
                let delay = policy.delay(retry);
                retry += 1;
                tracing::warn!(
                    endpoint,
                    retry,
                    max_retries = policy.max_retries,
                    error = %e,
                    "transport error, retrying in {delay:?}"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
