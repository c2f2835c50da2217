//! A set of helpers for testing

mod block;
mod consensus;
mod http_client;
mod metrics;
mod provider;

pub use block::BlockBuilder;
pub use consensus::ConsensusBlockBuilder;
pub use http_client::{create_test_http_client, fast_fetch_options};
pub use metrics::RecordingMetrics;
pub use provider::{TestProvider, mock_execution_source, mock_provider};
