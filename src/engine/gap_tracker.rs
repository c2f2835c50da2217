//! On-demand measurement of the distance between consensus and execution
//! heights.

use std::sync::Arc;

use thiserror::Error;

use crate::{
    http_client::FetchError,
    providers::traits::{ConsensusSource, ExecutionSource},
};

/// A height read failed while computing the gap.
#[derive(Error, Debug)]
pub enum GapError {
    /// The consensus height could not be read.
    #[error("Failed to read consensus height: {0}")]
    Consensus(FetchError),

    /// The execution height could not be read.
    #[error("Failed to read execution height: {0}")]
    Execution(FetchError),
}

/// Computes `consensus height - execution height` from fresh reads.
#[derive(Clone)]
pub struct GapTracker {
    consensus: Arc<dyn ConsensusSource>,
    execution: Arc<dyn ExecutionSource>,
}

impl GapTracker {
    /// Creates a new `GapTracker`.
    pub fn new(consensus: Arc<dyn ConsensusSource>, execution: Arc<dyn ExecutionSource>) -> Self {
        Self { consensus, execution }
    }

    /// Reads both heights, execution first, and returns their difference.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn current_gap(&self) -> Result<i64, GapError> {
        let el_height = self.execution.current_height().await.map_err(GapError::Execution)?;
        let el_height = i64::try_from(el_height).map_err(|_| {
            GapError::Execution(FetchError::Parse(format!("height {el_height} out of range")))
        })?;
        let cl_height = self.consensus.current_height().await.map_err(GapError::Consensus)?;

        let gap = cl_height.checked_sub(el_height).ok_or_else(|| {
            GapError::Consensus(FetchError::Parse(format!(
                "gap between {cl_height} and {el_height} out of range"
            )))
        })?;
        tracing::debug!(cl_height, el_height, gap, "Measured consensus to execution gap.");
        Ok(gap)
    }
}
