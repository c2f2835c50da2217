use alloy::{
    providers::{DynProvider, Provider, ProviderBuilder},
    transports::mock::Asserter,
};
use url::Url;

use super::{create_test_http_client, fast_fetch_options};
use crate::providers::EvmRpcSource;

/// Type-erased provider used by test sources.
pub type TestProvider = DynProvider;

/// Creates a mock provider and an asserter for testing purposes.
pub fn mock_provider() -> (TestProvider, Asserter) {
    let asserter = Asserter::new();
    let provider = ProviderBuilder::new().connect_mocked_client(asserter.clone()).erased();
    (provider, asserter)
}

/// Creates an `EvmRpcSource` whose blocks come from the returned asserter and
/// whose `eth_blockNumber` calls go to `eth_endpoint`.
pub fn mock_execution_source(eth_endpoint: &str) -> (EvmRpcSource<TestProvider>, Asserter) {
    let (provider, asserter) = mock_provider();
    let endpoint = Url::parse(eth_endpoint).expect("invalid eth endpoint");
    let source =
        EvmRpcSource::new(provider, create_test_http_client(), endpoint, fast_fetch_options(1));
    (source, asserter)
}
