//! The polling loop walks consensus heights one at a time and feeds each block
//! to the correlation engine.

use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;

use super::correlation::{Correlation, CorrelationEngine, ProcessError};
use crate::{
    metrics::{BlockCounter, MetricsSink},
    models::ConsensusBlock,
    providers::traits::ConsensusSource,
};

/// Where the polling loop is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// No cursor yet; read the current consensus height.
    NeedHeight,
    /// Fetch and process the block at this height.
    FetchBlock(i64),
}

/// Decides whether the cursor moves past a block whose processing failed.
///
/// The cursor is held only when the block was structurally invalid and was
/// proposed by the watched validator, so that height is fetched again.
pub fn should_advance(err: &ProcessError, block: &ConsensusBlock, target_validator: &str) -> bool {
    !(matches!(err, ProcessError::InvalidBlock(_)) && block.proposer_address == target_validator)
}

/// Drives the correlation engine over consecutive consensus heights.
pub struct Poller {
    engine: CorrelationEngine,
    consensus: Arc<dyn ConsensusSource>,
    metrics: Arc<dyn MetricsSink>,
    polling_interval: Duration,
    error_backoff: Duration,
    cancellation_token: CancellationToken,
}

impl Poller {
    /// Creates a new `Poller`.
    pub fn new(
        engine: CorrelationEngine,
        consensus: Arc<dyn ConsensusSource>,
        metrics: Arc<dyn MetricsSink>,
        polling_interval: Duration,
        error_backoff: Duration,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self { engine, consensus, metrics, polling_interval, error_backoff, cancellation_token }
    }

    /// The engine driven by this poller.
    pub fn engine(&self) -> &CorrelationEngine {
        &self.engine
    }

    /// Performs one transition and returns the next state with the delay to
    /// wait before taking it.
    pub async fn step(&mut self, state: PollState) -> (PollState, Duration) {
        match state {
            PollState::NeedHeight => match self.consensus.current_height().await {
                Ok(height) => {
                    tracing::info!(height, "Starting from current consensus height.");
                    (PollState::FetchBlock(height), Duration::ZERO)
                }
                Err(e) => {
                    self.metrics.increment(BlockCounter::Errors);
                    tracing::error!(error = %e, "Failed to get current height.");
                    (PollState::NeedHeight, self.error_backoff)
                }
            },
            PollState::FetchBlock(height) => {
                let block = match self.consensus.fetch_block(height).await {
                    Ok(block) => block,
                    Err(e) => {
                        self.metrics.increment(BlockCounter::Errors);
                        tracing::error!(height, error = %e, "Failed to get block.");
                        return (PollState::FetchBlock(height), self.error_backoff);
                    }
                };

                let next = match self.engine.process_block(&block).await {
                    Ok(Correlation::NotTargetValidator { .. }) => height + 1,
                    Ok(outcome) => {
                        tracing::debug!(height, ?outcome, "Block processed.");
                        height + 1
                    }
                    Err(e) => {
                        self.metrics.increment(BlockCounter::Errors);
                        tracing::error!(height, error = %e, "Error processing block.");
                        if should_advance(&e, &block, self.engine.target_validator()) {
                            height + 1
                        } else {
                            height
                        }
                    }
                };
                (PollState::FetchBlock(next), self.polling_interval)
            }
        }
    }

    /// Starts the long-running polling loop.
    pub async fn run(mut self) {
        let mut state = PollState::NeedHeight;
        loop {
            if self.cancellation_token.is_cancelled() {
                break;
            }

            let (next, delay) = self.step(state).await;
            state = next;

            tokio::select! {
                biased;

                _ = self.cancellation_token.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
        tracing::info!(
            last_found_el_height = self.engine.last_found_el_height(),
            "Poller has shut down."
        );
    }
}
