use std::time::Duration;

use crate::{
    config::HttpRetryConfig,
    http_client::{FetchOptions, ResilientClient},
};

/// Creates a `ResilientClient` on a default `reqwest::Client`.
pub fn create_test_http_client() -> ResilientClient {
    ResilientClient::from_client(reqwest::Client::new())
}

/// Fetch options with `max_retries` retries spaced 1ms apart.
pub fn fast_fetch_options(max_retries: u32) -> FetchOptions {
    FetchOptions::new(HttpRetryConfig::constant(max_retries, Duration::from_millis(1)))
}
