//! A `ConsensusSource` backed by a CometBFT-style RPC endpoint.

use async_trait::async_trait;
use url::Url;

use super::traits::ConsensusSource;
use crate::{
    http_client::{FetchError, FetchOptions, ResilientClient},
    models::{BlockResponse, ConsensusBlock, StatusResponse},
};

/// Reads `/status` and `/block` from a consensus node.
#[derive(Debug, Clone)]
pub struct CometRpcSource {
    client: ResilientClient,
    base_url: String,
    height_options: FetchOptions,
    block_options: FetchOptions,
}

impl CometRpcSource {
    /// Creates a new `CometRpcSource`.
    ///
    /// `block_options` should carry the suspicious-response floor applied to
    /// block bodies.
    pub fn new(
        client: ResilientClient,
        rpc_endpoint: &Url,
        height_options: FetchOptions,
        block_options: FetchOptions,
    ) -> Self {
        let base_url = rpc_endpoint.as_str().trim_end_matches('/').to_string();
        Self { client, base_url, height_options, block_options }
    }
}

fn decode_status(body: &[u8]) -> Result<i64, FetchError> {
    let status: StatusResponse = serde_json::from_slice(body)
        .map_err(|e| FetchError::Parse(format!("failed to decode status response: {e}")))?;
    status.latest_height()
}

fn decode_block(body: &[u8]) -> Result<ConsensusBlock, FetchError> {
    let response: BlockResponse = serde_json::from_slice(body)
        .map_err(|e| FetchError::InvalidBlock(format!("failed to decode block response: {e}")))?;
    let block = ConsensusBlock::from(response);
    if block.proposer_address.is_empty() {
        return Err(FetchError::InvalidBlock("empty proposer address".into()));
    }
    Ok(block)
}

#[async_trait]
impl ConsensusSource for CometRpcSource {
    #[tracing::instrument(skip(self), level = "debug")]
    async fn current_height(&self) -> Result<i64, FetchError> {
        let url = format!("{}/status", self.base_url);
        let height = self.client.send(|c| c.get(&url), &self.height_options, decode_status).await?;
        tracing::debug!(height, "Fetched consensus height.");
        Ok(height)
    }

    #[tracing::instrument(skip(self), level = "debug")]
    async fn fetch_block(&self, height: i64) -> Result<ConsensusBlock, FetchError> {
        let url = format!("{}/block", self.base_url);
        let block = self
            .client
            .send(|c| c.get(&url).query(&[("height", height)]), &self.block_options, decode_block)
            .await?;
        tracing::debug!(
            height,
            proposer = %block.proposer_address,
            tx_count = block.tx_count(),
            "Fetched consensus block."
        );
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mockito::Matcher;

    use super::*;
    use crate::{config::HttpRetryConfig, test_helpers::ConsensusBlockBuilder};

    fn source(server: &mockito::Server, min_body_len: usize) -> CometRpcSource {
        let fast = HttpRetryConfig::constant(2, Duration::from_millis(1));
        CometRpcSource::new(
            ResilientClient::from_client(reqwest::Client::new()),
            &Url::parse(&format!("{}/", server.url())).unwrap(),
            FetchOptions::new(fast.clone()),
            FetchOptions::new(fast).min_body_len(min_body_len),
        )
    }

    fn block_body(height: i64, proposer: &str) -> String {
        ConsensusBlockBuilder::new().height(height).proposer(proposer).response_body()
    }

    #[tokio::test]
    async fn test_current_height() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/status")
            .with_status(200)
            .with_body(r#"{"result":{"sync_info":{"latest_block_height":"4242"}}}"#)
            .create_async()
            .await;

        let height = source(&server, 0).current_height().await.unwrap();
        assert_eq!(height, 4242);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_current_height_non_numeric_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/status")
            .with_status(200)
            .with_body(r#"{"result":{"sync_info":{"latest_block_height":"tip"}}}"#)
            .expect(1)
            .create_async()
            .await;

        let result = source(&server, 0).current_height().await;
        assert!(matches!(result, Err(FetchError::Parse(_))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_block() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/block")
            .match_query(Matcher::UrlEncoded("height".into(), "100".into()))
            .with_status(200)
            .with_body(block_body(100, "VALIDATOR"))
            .create_async()
            .await;

        let block = source(&server, 100).fetch_block(100).await.unwrap();
        assert_eq!(block.parse_height().unwrap(), 100);
        assert_eq!(block.proposer_address, "VALIDATOR");
        assert!(block.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_block_empty_proposer_retried_then_invalid() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/block")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(block_body(7, ""))
            .expect(3)
            .create_async()
            .await;

        let result = source(&server, 100).fetch_block(7).await;
        assert!(matches!(
            result,
            Err(FetchError::InvalidBlock(ref msg)) if msg.contains("proposer")
        ));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_block_short_body_is_invalid() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/block")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"error":"busy"}"#)
            .expect(3)
            .create_async()
            .await;

        let result = source(&server, 100).fetch_block(7).await;
        assert!(matches!(result, Err(FetchError::InvalidBlock(_))));
        mock.assert_async().await;
    }
}
