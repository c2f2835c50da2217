//! The correlation engine locates, for each consensus block proposed by the
//! watched validator, the execution block it produced.
//!
//! The expected execution height is `cl_height - gap`. A small window around
//! it is scanned in ascending order for a block whose coinbase matches the
//! configured address. When the previous hit is close to the expected height
//! the window continues forward from that hit instead of re-centring on the
//! gap estimate.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use super::gap_tracker::{GapError, GapTracker};
use crate::{
    config::AppConfig,
    metrics::{BlockCounter, BlockGauge, MetricsSink},
    models::{ConsensusBlock, ConsensusTx, ExecutionBlock},
    providers::traits::{ConsensusSource, ExecutionSource},
};

/// Errors that abort a single correlation attempt.
#[derive(Error, Debug)]
pub enum ProcessError {
    /// The block is missing its hash or proposer address.
    #[error("Invalid block: {0}")]
    InvalidBlock(String),

    /// The block height is not a decimal integer.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The gap could not be measured.
    #[error("Gap unavailable: {0}")]
    Gap(#[from] GapError),
}

/// Addresses and window tuning for the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationSettings {
    /// Consensus proposer address of the watched validator.
    pub target_validator: String,
    /// Execution coinbase of the watched validator, EIP-55 checksummed.
    pub evm_address: String,
    /// Half-width of a re-centred window.
    pub search_offset: i64,
    /// Maximum `expected - last_found` distance that continues the window.
    pub continuation_threshold: i64,
}

impl From<&AppConfig> for CorrelationSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            target_validator: config.target_validator.clone(),
            evm_address: config.evm_address.clone(),
            search_offset: config.search_offset,
            continuation_threshold: config.continuation_threshold,
        }
    }
}

/// Inclusive range of execution heights to scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchWindow {
    /// First height scanned.
    pub start: i64,
    /// Last height scanned.
    pub end: i64,
}

impl SearchWindow {
    /// Chooses the window for `expected`, given the last confirmed height
    /// (0 when nothing has been found yet). Returns `None` if a bound does
    /// not fit in an `i64`.
    pub fn select(expected: i64, last_found: i64, offset: i64, threshold: i64) -> Option<Self> {
        if last_found > 0 && expected.checked_sub(last_found)? <= threshold {
            let start = last_found.checked_add(1)?;
            let end = start.checked_add(offset.checked_mul(2)?)?;
            Some(Self { start, end })
        } else {
            Some(Self { start: expected.checked_sub(offset)?, end: expected.checked_add(offset)? })
        }
    }

    /// Heights in ascending order. Negative heights do not exist and are
    /// skipped.
    pub fn heights(&self) -> impl Iterator<Item = u64> + use<> {
        (self.start.max(0)..=self.end).filter_map(|h| u64::try_from(h).ok())
    }
}

/// Outcome of processing one consensus block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Correlation {
    /// The block was proposed by someone else; nothing was recorded.
    NotTargetValidator {
        /// Proposer of the block.
        proposer: String,
    },
    /// A matching execution block was found.
    Confirmed {
        /// Consensus height.
        cl_height: i64,
        /// Gap used to compute the expected height.
        gap: i64,
        /// Window that was scanned.
        window: SearchWindow,
        /// Height of the matching execution block.
        el_height: u64,
        /// Hash of the matching execution block.
        el_hash: String,
        /// The consensus block carried no transactions.
        empty_consensus_block: bool,
        /// The execution block carried no transactions.
        empty_execution_block: bool,
    },
    /// No height in the window was produced by the watched validator.
    Missed {
        /// Consensus height.
        cl_height: i64,
        /// Gap used to compute the expected height.
        gap: i64,
        /// Window that was scanned.
        window: SearchWindow,
        /// The consensus block carried no transactions.
        empty_consensus_block: bool,
    },
}

/// Owns the correlation state and emits proposal metrics.
pub struct CorrelationEngine {
    settings: CorrelationSettings,
    consensus: Arc<dyn ConsensusSource>,
    execution: Arc<dyn ExecutionSource>,
    gap_tracker: GapTracker,
    metrics: Arc<dyn MetricsSink>,
    /// Height of the last confirmed execution block, 0 if none yet.
    last_found_el_height: i64,
}

impl CorrelationEngine {
    /// Creates a new `CorrelationEngine` with no prior hit.
    pub fn new(
        settings: CorrelationSettings,
        consensus: Arc<dyn ConsensusSource>,
        execution: Arc<dyn ExecutionSource>,
        gap_tracker: GapTracker,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self { settings, consensus, execution, gap_tracker, metrics, last_found_el_height: 0 }
    }

    /// Seeds the last confirmed execution height.
    pub fn with_last_found_el_height(mut self, height: i64) -> Self {
        self.last_found_el_height = height;
        self
    }

    /// Height of the last confirmed execution block, 0 if none yet.
    pub fn last_found_el_height(&self) -> i64 {
        self.last_found_el_height
    }

    /// The configured consensus proposer address.
    pub fn target_validator(&self) -> &str {
        &self.settings.target_validator
    }

    /// Correlates one consensus block with the execution layer.
    #[tracing::instrument(skip_all, fields(height = %block.height), level = "debug")]
    pub async fn process_block(
        &mut self,
        block: &ConsensusBlock,
    ) -> Result<Correlation, ProcessError> {
        if !block.is_well_formed() {
            return Err(ProcessError::InvalidBlock(format!(
                "block at height {:?} has an empty hash or proposer address",
                block.height
            )));
        }

        tracing::debug!(proposer = %block.proposer_address, "Processing block.");
        if block.proposer_address != self.settings.target_validator {
            return Ok(Correlation::NotTargetValidator {
                proposer: block.proposer_address.clone(),
            });
        }

        let cl_height = block.parse_height().map_err(|e| ProcessError::Parse(e.to_string()))?;

        self.metrics.set(BlockGauge::CurrentHeight, cl_height as f64);
        self.metrics.increment(BlockCounter::TotalProposed);
        tracing::info!(
            height = cl_height,
            proposer = %block.proposer_address,
            "Found block proposed by target validator."
        );
        log_transactions(block);

        let gap = self.gap_tracker.current_gap().await?;
        let expected = cl_height.checked_sub(gap).ok_or_else(|| {
            ProcessError::Parse(format!("expected height {cl_height} - {gap} overflows"))
        })?;
        let window = SearchWindow::select(
            expected,
            self.last_found_el_height,
            self.settings.search_offset,
            self.settings.continuation_threshold,
        )
        .ok_or_else(|| ProcessError::Parse(format!("search window around {expected} overflows")))?;
        tracing::debug!(
            gap,
            expected,
            start = window.start,
            end = window.end,
            last_found = self.last_found_el_height,
            "Selected execution search window."
        );

        let empty_consensus_block = self.check_consensus_block(cl_height, block).await;

        match self.scan(window).await {
            Some(found) => {
                // Heights come from a window whose lower bound is clamped at 0.
                self.last_found_el_height = i64::try_from(found.height).unwrap_or(i64::MAX);
                self.metrics.increment(BlockCounter::ExecutionConfirmed);
                tracing::info!(
                    cl_height,
                    el_height = found.height,
                    hash = %found.hash,
                    "Found execution block."
                );

                if found.is_empty() {
                    self.metrics.increment(BlockCounter::EmptyExecutionBlocks);
                    tracing::info!(height = found.height, "Empty execution block.");
                }

                Ok(Correlation::Confirmed {
                    cl_height,
                    gap,
                    window,
                    el_height: found.height,
                    el_hash: found.hash.to_string(),
                    empty_consensus_block,
                    empty_execution_block: found.is_empty(),
                })
            }
            None => {
                self.metrics.increment(BlockCounter::ExecutionMissed);
                tracing::warn!(
                    cl_height,
                    start_height = window.start,
                    end_height = window.end,
                    "Block not found in range."
                );
                Ok(Correlation::Missed { cl_height, gap, window, empty_consensus_block })
            }
        }
    }

    /// Re-reads the consensus block at `cl_height` and records whether it is
    /// empty. Falls back to the block in hand when the re-read fails.
    async fn check_consensus_block(&self, cl_height: i64, in_hand: &ConsensusBlock) -> bool {
        let empty = match self.consensus.fetch_block(cl_height).await {
            Ok(fresh) => fresh.is_empty(),
            Err(e) => {
                self.metrics.increment(BlockCounter::Errors);
                tracing::error!(
                    height = cl_height,
                    error = %e,
                    "Failed to re-fetch consensus block."
                );
                in_hand.is_empty()
            }
        };

        if empty {
            self.metrics.increment(BlockCounter::EmptyConsensusBlocks);
            tracing::info!(height = cl_height, "Empty consensus block.");
        }
        empty
    }

    /// Returns the first block in `window` produced by the configured address.
    async fn scan(&self, window: SearchWindow) -> Option<ExecutionBlock> {
        for height in window.heights() {
            let block = match self.execution.fetch_block(Some(height)).await {
                Ok(block) => block,
                Err(e) => {
                    self.metrics.increment(BlockCounter::Errors);
                    tracing::error!(height, error = %e, "Failed to fetch execution block.");
                    continue;
                }
            };

            if block.producer == self.settings.evm_address {
                return Some(block);
            }
            tracing::debug!(
                height,
                producer = %block.producer,
                "Execution block produced by another address."
            );
        }
        None
    }
}

fn log_transactions(block: &ConsensusBlock) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }
    for (index, raw) in block.txs.iter().enumerate() {
        match ConsensusTx::decode(raw) {
            Ok(tx) => {
                tracing::debug!(
                    index,
                    msg_type = tx.msg_type,
                    data_length = tx.data_length,
                    "Decoded consensus transaction."
                );
                for (chunk_index, chunk) in tx.payload_chunks().enumerate() {
                    tracing::debug!(index, chunk_index, chunk = %chunk, "Transaction payload.");
                }
            }
            Err(e) => tracing::debug!(index, error = %e, "Failed to decode consensus transaction."),
        }
    }
}
