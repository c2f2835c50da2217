//! Block correlation metrics: the sink interface the engine writes to, and a
//! Prometheus-backed implementation on top of the `metrics` facade.

pub mod server;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Counters emitted by the correlation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockCounter {
    /// Blocks proposed by the watched validator.
    TotalProposed,
    /// Proposed blocks found on the execution layer.
    ExecutionConfirmed,
    /// Proposed blocks not found in the search window.
    ExecutionMissed,
    /// Proposed consensus blocks with no transactions.
    EmptyConsensusBlocks,
    /// Confirmed execution blocks with no transactions.
    EmptyExecutionBlocks,
    /// Errors encountered while processing blocks.
    Errors,
}

impl BlockCounter {
    /// Every counter, in exposition order.
    pub const ALL: [BlockCounter; 6] = [
        BlockCounter::TotalProposed,
        BlockCounter::ExecutionConfirmed,
        BlockCounter::ExecutionMissed,
        BlockCounter::EmptyConsensusBlocks,
        BlockCounter::EmptyExecutionBlocks,
        BlockCounter::Errors,
    ];

    /// Exposition name.
    pub fn name(self) -> &'static str {
        match self {
            BlockCounter::TotalProposed => "validator_total_blocks_proposed",
            BlockCounter::ExecutionConfirmed => "validator_execution_blocks_confirmed",
            BlockCounter::ExecutionMissed => "validator_execution_blocks_missed",
            BlockCounter::EmptyConsensusBlocks => "validator_empty_consensus_blocks",
            BlockCounter::EmptyExecutionBlocks => "validator_empty_execution_blocks",
            BlockCounter::Errors => "validator_block_processing_errors",
        }
    }

    /// Help text.
    pub fn help(self) -> &'static str {
        match self {
            BlockCounter::TotalProposed => "Total number of blocks proposed by our validator",
            BlockCounter::ExecutionConfirmed => {
                "Number of proposed blocks that made it to the execution layer"
            }
            BlockCounter::ExecutionMissed => {
                "Number of proposed blocks that failed to make it to the execution layer"
            }
            BlockCounter::EmptyConsensusBlocks => {
                "Number of blocks proposed with no transactions on consensus layer"
            }
            BlockCounter::EmptyExecutionBlocks => {
                "Number of blocks confirmed on execution layer with no transactions"
            }
            BlockCounter::Errors => "Number of errors encountered while processing blocks",
        }
    }
}

/// Gauges emitted by the background updaters and the correlation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockGauge {
    /// Latest consensus height observed.
    CurrentHeight,
    /// Consensus height minus execution height.
    ElToClGap,
}

impl BlockGauge {
    /// Every gauge, in exposition order.
    pub const ALL: [BlockGauge; 2] = [BlockGauge::CurrentHeight, BlockGauge::ElToClGap];

    /// Exposition name.
    pub fn name(self) -> &'static str {
        match self {
            BlockGauge::CurrentHeight => "validator_current_block_height",
            BlockGauge::ElToClGap => "validator_el_to_cl_gap",
        }
    }

    /// Help text.
    pub fn help(self) -> &'static str {
        match self {
            BlockGauge::CurrentHeight => "Current block height being processed",
            BlockGauge::ElToClGap => "Gap between execution and consensus layer block heights",
        }
    }
}

/// Write-only metric interface shared by every task.
pub trait MetricsSink: Send + Sync {
    /// Increments `counter` by one.
    fn increment(&self, counter: BlockCounter);

    /// Sets `gauge` to `value`.
    fn set(&self, gauge: BlockGauge, value: f64);
}

/// Registers help text for every metric with the installed recorder.
pub fn describe_metrics() {
    for c in BlockCounter::ALL {
        describe_counter!(c.name(), c.help());
    }
    for g in BlockGauge::ALL {
        describe_gauge!(g.name(), g.help());
    }
}

/// Installs the global Prometheus recorder and returns its render handle.
pub fn install_prometheus_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    describe_metrics();
    Ok(handle)
}

/// `MetricsSink` that forwards to whichever recorder the `metrics` facade
/// currently has.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusSink;

impl PrometheusSink {
    /// Creates a new `PrometheusSink`.
    pub fn new() -> Self {
        Self
    }
}

impl MetricsSink for PrometheusSink {
    fn increment(&self, c: BlockCounter) {
        counter!(c.name()).increment(1);
    }

    fn set(&self, g: BlockGauge, value: f64) {
        gauge!(g.name()).set(value);
    }
}
