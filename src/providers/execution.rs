//! An `ExecutionSource` backed by an EVM JSON-RPC endpoint.

use alloy::{eips::BlockNumberOrTag, providers::Provider};
use async_trait::async_trait;
use url::Url;

use super::traits::ExecutionSource;
use crate::{
    http_client::{FetchError, FetchOptions, ResilientClient},
    models::{BlockNumberResponse, ExecutionBlock, JsonRpcRequest},
};

/// Reads execution-layer blocks through an alloy provider and the chain head
/// through a raw `eth_blockNumber` call on the shared HTTP client.
pub struct EvmRpcSource<P> {
    provider: P,
    client: ResilientClient,
    eth_endpoint: Url,
    height_options: FetchOptions,
}

impl<P> EvmRpcSource<P>
where
    P: Provider,
{
    /// Creates a new `EvmRpcSource`.
    #[tracing::instrument(skip(provider, client), level = "debug")]
    pub fn new(
        provider: P,
        client: ResilientClient,
        eth_endpoint: Url,
        height_options: FetchOptions,
    ) -> Self {
        Self { provider, client, eth_endpoint, height_options }
    }
}

fn decode_block_number(body: &[u8]) -> Result<u64, FetchError> {
    let response: BlockNumberResponse = serde_json::from_slice(body)
        .map_err(|e| FetchError::Parse(format!("failed to decode eth_blockNumber response: {e}")))?;
    response.block_number()
}

#[async_trait]
impl<P> ExecutionSource for EvmRpcSource<P>
where
    P: Provider + Send + Sync,
{
    #[tracing::instrument(skip(self), level = "debug")]
    async fn current_height(&self) -> Result<u64, FetchError> {
        let request = JsonRpcRequest::new("eth_blockNumber");
        let height = self
            .client
            .send(
                |c| c.post(self.eth_endpoint.clone()).json(&request),
                &self.height_options,
                decode_block_number,
            )
            .await?;
        tracing::debug!(height, "Fetched execution height.");
        Ok(height)
    }

    #[tracing::instrument(skip(self), level = "debug")]
    async fn fetch_block(&self, height: Option<u64>) -> Result<ExecutionBlock, FetchError> {
        let tag = height.map_or(BlockNumberOrTag::Latest, BlockNumberOrTag::Number);
        let block = self
            .provider
            .get_block_by_number(tag)
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?
            .ok_or_else(|| {
                FetchError::NotFound(height.map_or_else(|| "latest".to_string(), |h| h.to_string()))
            })?;
        Ok(ExecutionBlock::from(&block))
    }
}
