//! This module defines the interfaces the correlation engine uses to read the
//! consensus and execution layers.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::{
    http_client::FetchError,
    models::{ConsensusBlock, ExecutionBlock},
};

/// A source of consensus-layer heights and blocks.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ConsensusSource: Send + Sync {
    /// Latest block height reported by the consensus node.
    async fn current_height(&self) -> Result<i64, FetchError>;

    /// Fetches and validates the block at `height`.
    async fn fetch_block(&self, height: i64) -> Result<ConsensusBlock, FetchError>;
}

/// A source of execution-layer heights and blocks.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ExecutionSource: Send + Sync {
    /// Latest block number reported by the execution node.
    async fn current_height(&self) -> Result<u64, FetchError>;

    /// Fetches the block at `height`, or the latest block when `None`.
    async fn fetch_block(&self, height: Option<u64>) -> Result<ExecutionBlock, FetchError>;
}
