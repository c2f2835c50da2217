//! Background refresh of the current-height and gap gauges.

use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;

use super::gap_tracker::GapTracker;
use crate::{
    metrics::{BlockCounter, BlockGauge, MetricsSink},
    providers::traits::ConsensusSource,
};

/// Periodically publishes the consensus head and the consensus/execution gap.
///
/// Shares nothing with the polling loop except the metrics sink.
#[derive(Clone)]
pub struct GaugeUpdater {
    consensus: Arc<dyn ConsensusSource>,
    gap_tracker: GapTracker,
    metrics: Arc<dyn MetricsSink>,
    interval: Duration,
    cancellation_token: CancellationToken,
}

impl GaugeUpdater {
    /// Creates a new `GaugeUpdater`.
    pub fn new(
        consensus: Arc<dyn ConsensusSource>,
        gap_tracker: GapTracker,
        metrics: Arc<dyn MetricsSink>,
        interval: Duration,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self { consensus, gap_tracker, metrics, interval, cancellation_token }
    }

    /// Reads the consensus head once and publishes it.
    pub async fn refresh_height(&self) {
        match self.consensus.current_height().await {
            Ok(height) => self.metrics.set(BlockGauge::CurrentHeight, height as f64),
            Err(e) => {
                self.metrics.increment(BlockCounter::Errors);
                tracing::error!(error = %e, "Failed to get current height.");
            }
        }
    }

    /// Measures the gap once and publishes it.
    pub async fn refresh_gap(&self) {
        match self.gap_tracker.current_gap().await {
            Ok(gap) => self.metrics.set(BlockGauge::ElToClGap, gap as f64),
            Err(e) => {
                self.metrics.increment(BlockCounter::Errors);
                tracing::error!(error = %e, "Failed to get current gap.");
            }
        }
    }

    /// Runs the height refresh loop until cancelled. Each refresh is followed
    /// by a full `interval` of idle time, however long the refresh took.
    pub async fn run_height(self) {
        loop {
            self.refresh_height().await;
            if !self.pause().await {
                break;
            }
        }
        tracing::debug!("Height gauge updater has shut down.");
    }

    /// Runs the gap refresh loop until cancelled, paced like
    /// [`GaugeUpdater::run_height`].
    pub async fn run_gap(self) {
        loop {
            self.refresh_gap().await;
            if !self.pause().await {
                break;
            }
        }
        tracing::debug!("Gap gauge updater has shut down.");
    }

    /// Sleeps one interval. Returns `false` if cancelled first.
    async fn pause(&self) -> bool {
        tokio::select! {
            biased;

            _ = self.cancellation_token.cancelled() => false,
            _ = tokio::time::sleep(self.interval) => true,
        }
    }
}
