//! HTTP retry helpers for transient errors.
//!
//! Every request the dashboard sends goes through [`send_text`] so that
//! connection failures, timeouts, rate limiting and server errors are
//! retried with exponential backoff before the failure reaches the
//! controller. Malformed bodies are not retried: they are a payload problem,
//! not a transport one, and the caller degrades the affected view instead.

use std::time::Duration;

use crate::ClientError;

/// How often and how patiently a request is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each following one.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// A policy that never retries.
    pub const NONE: Self = Self {
        max_retries: 0,
        base_delay: Duration::ZERO,
    };

    /// Backoff before retry number `attempt` (1-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(1u32 << attempt.saturating_sub(1).min(16))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// Sends an HTTP request and returns the response body as a `String`.
///
/// The `build_request` closure is called on each attempt to construct a
/// fresh [`reqwest::RequestBuilder`] (builders are consumed by `.send()`).
///
/// # Errors
///
/// Returns [`ClientError`] if the request fails after all retries, the
/// server answers with a non-retryable status, or the body cannot be read.
#[allow(clippy::future_not_send)]
pub async fn send_text<F>(policy: RetryPolicy, build_request: F) -> Result<String, ClientError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let response = send_inner(policy, &build_request).await?;
    Ok(response.text().await?)
}

/// Core retry loop. Returns the first successful (2xx) response.
#[allow(clippy::future_not_send)]
async fn send_inner<F>(policy: RetryPolicy, build_request: &F) -> Result<reqwest::Response, ClientError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let max_retries = policy.max_retries;
    let mut attempt = 0;

    loop {
        if attempt > 0 {
            let delay = policy.delay_for(attempt);
            log::warn!("  retry {attempt}/{max_retries} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        match build_request().send().await {
            Err(e) => {
                if is_transient(&e) && attempt < max_retries {
                    log::warn!("  transient error: {e}");
                    attempt += 1;
                    continue;
                }
                return Err(ClientError::Http(e));
            }
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return Ok(response);
                }
                let url = response.url().to_string();
                if is_retryable_status(status) && attempt < max_retries {
                    log::warn!("  HTTP {status} from {url}");
                    attempt += 1;
                    continue;
                }
                return Err(ClientError::Status { status, url });
            }
        }
    }
}

/// Rate limiting and server errors are worth another attempt; every other
/// non-2xx status is permanent.
#[must_use]
pub fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_request()
}
