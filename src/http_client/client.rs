//! The resilient fetch client: a single pooled `reqwest::Client` plus one
//! retry loop whose pacing comes from an [`HttpRetryConfig`].

use std::time::SystemTime;

use reqwest::{Client, RequestBuilder};
use reqwest_retry::{Jitter, RetryDecision, RetryPolicy, policies::ExponentialBackoff};

use super::error::{FetchError, HttpClientError};
use crate::config::{BaseHttpClientConfig, HttpRetryConfig, JitterSetting};

/// Builds the backoff policy described by `config`.
///
/// # Parameters:
/// - `config`: Configuration for retry policies
///
/// # Returns
/// An `ExponentialBackoff` that yields the delay before each retry and stops
/// after `max_retries`.
pub fn build_retry_policy(config: &HttpRetryConfig) -> ExponentialBackoff {
    // Determine the jitter setting and create the policy builder accordingly
    let policy_builder = match config.jitter {
        JitterSetting::None => ExponentialBackoff::builder().jitter(Jitter::None),
        JitterSetting::Full => ExponentialBackoff::builder().jitter(Jitter::Full),
    };

    // retry_bounds rejects a maximum below the minimum.
    let max_backoff = config.max_backoff_secs.max(config.initial_backoff_ms);

    policy_builder
        .base(config.base_for_backoff)
        .retry_bounds(config.initial_backoff_ms, max_backoff)
        .build_with_max_retries(config.max_retries)
}

/// Per-call-site settings for [`ResilientClient::send`].
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOptions {
    /// Retry policy for this call site.
    pub retry: HttpRetryConfig,
    /// Bodies shorter than this are treated as suspicious and retried.
    pub min_body_len: usize,
}

impl FetchOptions {
    /// Options with the given retry policy and no body-length floor.
    pub fn new(retry: HttpRetryConfig) -> Self {
        Self { retry, min_body_len: 0 }
    }

    /// Sets the suspicious-response floor.
    pub fn min_body_len(mut self, min_body_len: usize) -> Self {
        self.min_body_len = min_body_len;
        self
    }
}

/// HTTP client with bounded retries shared by every upstream call.
#[derive(Debug, Clone)]
pub struct ResilientClient {
    client: Client,
}

impl ResilientClient {
    /// Creates a client with a connection pool tuned by `config`.
    pub fn new(config: &BaseHttpClientConfig) -> Result<Self, HttpClientError> {
        let client = Client::builder()
            .pool_max_idle_per_host(config.max_idle_per_host)
            .pool_idle_timeout(Some(config.idle_timeout))
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| HttpClientError::Build(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wraps an existing `reqwest::Client`.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Sends the request produced by `build` until `decode` accepts the body,
    /// a non-retryable error occurs, or the retry budget is spent. The last
    /// observed error is returned in the latter cases.
    pub async fn send<T, B, D>(
        &self,
        build: B,
        options: &FetchOptions,
        decode: D,
    ) -> Result<T, FetchError>
    where
        B: Fn(&Client) -> RequestBuilder,
        D: Fn(&[u8]) -> Result<T, FetchError>,
    {
        let policy = build_retry_policy(&options.retry);
        let started = SystemTime::now();
        let mut past_retries: u32 = 0;

        loop {
            let err = match self.attempt(&build, options.min_body_len, &decode).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !err.is_retryable() {
                return Err(err);
            }

            match policy.should_retry(started, past_retries) {
                RetryDecision::Retry { execute_after } => {
                    let delay = execute_after.duration_since(SystemTime::now()).unwrap_or_default();
                    tracing::warn!(
                        attempt = past_retries + 1,
                        max_attempts = options.retry.max_attempts(),
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Request failed, retrying."
                    );
                    tokio::time::sleep(delay).await;
                    past_retries += 1;
                }
                RetryDecision::DoNotRetry => {
                    tracing::debug!(
                        attempts = past_retries + 1,
                        error = %err,
                        "Retries exhausted."
                    );
                    return Err(err);
                }
            }
        }
    }

    async fn attempt<T, B, D>(
        &self,
        build: &B,
        min_body_len: usize,
        decode: &D,
    ) -> Result<T, FetchError>
    where
        B: Fn(&Client) -> RequestBuilder,
        D: Fn(&[u8]) -> Result<T, FetchError>,
    {
        let response = build(&self.client).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Network(format!("unexpected HTTP status {status}")));
        }

        let body = response.bytes().await?;
        if body.len() < min_body_len {
            return Err(FetchError::InvalidBlock(format!(
                "received suspicious response ({} bytes): {}",
                body.len(),
                String::from_utf8_lossy(&body)
            )));
        }

        decode(&body)
    }
}
