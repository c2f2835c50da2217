//! Consensus and execution layer sources.

pub mod consensus;
pub mod execution;
pub mod rpc;
pub mod traits;

use std::sync::Arc;

pub use consensus::CometRpcSource;
pub use execution::EvmRpcSource;
pub use rpc::create_provider;
pub use traits::{ConsensusSource, ExecutionSource};

use crate::{
    config::AppConfig,
    http_client::{FetchOptions, HttpClientError, ResilientClient},
};

/// The pair of sources the engine reads from.
#[derive(Clone)]
pub struct Sources {
    /// Consensus-layer source.
    pub consensus: Arc<dyn ConsensusSource>,
    /// Execution-layer source.
    pub execution: Arc<dyn ExecutionSource>,
}

impl Sources {
    /// Builds both sources from configuration, sharing one pooled HTTP client.
    pub fn from_config(config: &AppConfig) -> Result<Self, HttpClientError> {
        let client = ResilientClient::new(&config.http_base)?;
        let height_options = FetchOptions::new(config.height_retry.clone());

        let consensus = CometRpcSource::new(
            client.clone(),
            &config.rpc_endpoint,
            height_options.clone(),
            FetchOptions::new(config.block_retry.clone()).min_body_len(config.min_body_bytes),
        );
        tracing::debug!(endpoint = %config.rpc_endpoint, "Consensus source initialized.");

        let provider = create_provider(config.eth_endpoint.clone(), config.rpc_retry.clone());
        let execution =
            EvmRpcSource::new(provider, client, config.eth_endpoint.clone(), height_options);
        tracing::debug!(
            endpoint = %config.eth_endpoint,
            retry_policy = ?config.rpc_retry,
            "Execution source initialized."
        );

        Ok(Self { consensus: Arc::new(consensus), execution: Arc::new(execution) })
    }
}
