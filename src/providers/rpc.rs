//! This module provides functionality to create a provider for EVM RPC requests
//! with retry logic and backoff strategies.

use alloy::{
    providers::{Provider, ProviderBuilder},
    rpc::client::RpcClient,
    transports::layers::RetryBackoffLayer,
};
use url::Url;

use crate::config::RpcRetryConfig;

/// Creates a provider for `url` whose transport retries rate-limited and
/// transient failures according to `retry_config`.
pub fn create_provider(url: Url, retry_config: RpcRetryConfig) -> impl Provider + Clone {
    // Instantiate the RetryBackoffLayer with the configuration
    let retry_layer = RetryBackoffLayer::new(
        retry_config.max_retry,
        retry_config.backoff_ms,
        retry_config.compute_units_per_second,
    );

    let client = RpcClient::builder().layer(retry_layer).http(url);
    ProviderBuilder::new().connect_client(client)
}
