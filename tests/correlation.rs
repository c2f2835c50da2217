//! End-to-end correlation against mocked consensus and execution endpoints.

use std::{sync::Arc, time::Duration};

use alloy::{
    primitives::{Address, B256, address},
    rpc::types::Block,
    transports::mock::Asserter,
};
use mockito::{Matcher, ServerGuard};
use url::Url;
use validator_exporter::{
    config::HttpRetryConfig,
    engine::{Correlation, CorrelationEngine, CorrelationSettings, GapTracker, SearchWindow},
    http_client::{FetchOptions, ResilientClient},
    metrics::{BlockCounter, BlockGauge},
    providers::{CometRpcSource, ConsensusSource, ExecutionSource},
    test_helpers::{BlockBuilder, ConsensusBlockBuilder, RecordingMetrics, mock_execution_source},
};

const TARGET: &str = "ABCDEF0123456789ABCDEF0123456789ABCDEF01";
const EVM: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
const OURS: Address = address!("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed");
const OTHER: Address = address!("00000000000000000000000000000000000000aa");
const TX: &str = "AAAAAQAAAAA=";

struct Harness {
    engine: CorrelationEngine,
    asserter: Asserter,
    metrics: Arc<RecordingMetrics>,
}

fn fast_options() -> FetchOptions {
    FetchOptions::new(HttpRetryConfig::constant(1, Duration::from_millis(1)))
}

/// Mocks the consensus `/status` and `/block` endpoints and the execution
/// `eth_blockNumber` call on one server.
async fn mock_upstreams(
    server: &mut ServerGuard,
    cl_height: i64,
    el_height: u64,
    block: ConsensusBlockBuilder,
) {
    server
        .mock("GET", "/status")
        .with_status(200)
        .with_body(format!(
            r#"{{"result":{{"sync_info":{{"latest_block_height":"{cl_height}"}}}}}}"#
        ))
        .create_async()
        .await;
    server
        .mock("GET", "/block")
        .match_query(Matcher::UrlEncoded("height".into(), cl_height.to_string()))
        .with_status(200)
        .with_body(block.height(cl_height).response_body())
        .create_async()
        .await;
    server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(serde_json::json!({ "method": "eth_blockNumber" })))
        .with_status(200)
        .with_body(format!(r#"{{"jsonrpc":"2.0","id":"1","result":"{el_height:#x}"}}"#))
        .create_async()
        .await;
}

fn harness(server: &ServerGuard) -> Harness {
    let consensus: Arc<dyn ConsensusSource> = Arc::new(CometRpcSource::new(
        ResilientClient::from_client(reqwest::Client::new()),
        &Url::parse(&server.url()).unwrap(),
        fast_options(),
        fast_options().min_body_len(100),
    ));
    let (execution, asserter) = mock_execution_source(&server.url());
    let execution: Arc<dyn ExecutionSource> = Arc::new(execution);
    let metrics = Arc::new(RecordingMetrics::default());
    let settings = CorrelationSettings {
        target_validator: TARGET.into(),
        evm_address: EVM.into(),
        search_offset: 2,
        continuation_threshold: 5,
    };
    let engine = CorrelationEngine::new(
        settings,
        Arc::clone(&consensus),
        Arc::clone(&execution),
        GapTracker::new(consensus, execution),
        metrics.clone(),
    );
    Harness { engine, asserter, metrics }
}

#[tokio::test]
async fn confirms_first_matching_execution_block() {
    let mut server = mockito::Server::new_async().await;
    let cl_block = ConsensusBlockBuilder::new().proposer(TARGET).tx(TX);
    mock_upstreams(&mut server, 100, 95, cl_block).await;
    let Harness { mut engine, asserter, metrics } = harness(&server);

    // Window [93, 97] is scanned ascending; the first match is at 95.
    asserter.push_success(&BlockBuilder::new().number(93).beneficiary(OTHER).build());
    asserter.push_success(&BlockBuilder::new().number(94).beneficiary(OTHER).build());
    asserter.push_success(
        &BlockBuilder::new().number(95).beneficiary(OURS).hash(B256::repeat_byte(0x11)).build(),
    );

    let block = ConsensusBlockBuilder::new().height(100).proposer(TARGET).tx(TX).build();
    let outcome = engine.process_block(&block).await.unwrap();

    assert_eq!(
        outcome,
        Correlation::Confirmed {
            cl_height: 100,
            gap: 5,
            window: SearchWindow { start: 93, end: 97 },
            el_height: 95,
            el_hash: B256::repeat_byte(0x11).to_string(),
            empty_consensus_block: false,
            empty_execution_block: true,
        }
    );
    assert_eq!(engine.last_found_el_height(), 95);
    assert_eq!(metrics.counter(BlockCounter::TotalProposed), 1);
    assert_eq!(metrics.counter(BlockCounter::ExecutionConfirmed), 1);
    assert_eq!(metrics.counter(BlockCounter::EmptyExecutionBlocks), 1);
    assert_eq!(metrics.counter(BlockCounter::ExecutionMissed), 0);
    assert_eq!(metrics.counter(BlockCounter::Errors), 0);
    assert_eq!(metrics.gauge(BlockGauge::CurrentHeight), Some(100.0));
}

#[tokio::test]
async fn reports_miss_when_no_producer_matches() {
    let mut server = mockito::Server::new_async().await;
    mock_upstreams(&mut server, 200, 190, ConsensusBlockBuilder::new().proposer(TARGET)).await;
    let Harness { mut engine, asserter, metrics } = harness(&server);

    for height in 188..=192 {
        asserter.push_success(&BlockBuilder::new().number(height).beneficiary(OTHER).build());
    }

    let block = ConsensusBlockBuilder::new().height(200).proposer(TARGET).build();
    let outcome = engine.process_block(&block).await.unwrap();

    assert_eq!(
        outcome,
        Correlation::Missed {
            cl_height: 200,
            gap: 10,
            window: SearchWindow { start: 188, end: 192 },
            empty_consensus_block: true,
        }
    );
    assert_eq!(engine.last_found_el_height(), 0);
    assert_eq!(metrics.counter(BlockCounter::ExecutionMissed), 1);
    assert_eq!(metrics.counter(BlockCounter::EmptyConsensusBlocks), 1);
    assert_eq!(metrics.counter(BlockCounter::Errors), 0);
}

#[tokio::test]
async fn unavailable_execution_heights_are_counted_and_skipped() {
    let mut server = mockito::Server::new_async().await;
    let cl_block = ConsensusBlockBuilder::new().proposer(TARGET).tx(TX);
    mock_upstreams(&mut server, 100, 95, cl_block).await;
    let Harness { mut engine, asserter, metrics } = harness(&server);

    asserter.push_success(&Option::<Block>::None);
    asserter.push_failure_msg("upstream unavailable");
    asserter.push_success(&BlockBuilder::new().number(95).beneficiary(OURS).tx_count(2).build());

    let block = ConsensusBlockBuilder::new().height(100).proposer(TARGET).tx(TX).build();
    let outcome = engine.process_block(&block).await.unwrap();

    assert!(matches!(
        outcome,
        Correlation::Confirmed { el_height: 95, empty_execution_block: false, .. }
    ));
    assert_eq!(metrics.counter(BlockCounter::Errors), 2);
    assert_eq!(metrics.counter(BlockCounter::EmptyExecutionBlocks), 0);
}

#[tokio::test]
async fn other_proposers_touch_nothing() {
    let server = mockito::Server::new_async().await;
    let Harness { mut engine, metrics, .. } = harness(&server);

    let block = ConsensusBlockBuilder::new().height(7).proposer("SOMEONEELSE").build();
    let outcome = engine.process_block(&block).await.unwrap();

    assert_eq!(outcome, Correlation::NotTargetValidator { proposer: "SOMEONEELSE".into() });
    assert!(metrics.is_untouched());
}
