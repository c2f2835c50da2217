//! The exporter engine: gap measurement, block correlation, the polling loop
//! that drives it, and the background gauge updaters.

pub mod correlation;
pub mod gap_tracker;
pub mod gauges;
pub mod poller;

pub use correlation::{
    Correlation, CorrelationEngine, CorrelationSettings, ProcessError, SearchWindow,
};
pub use gap_tracker::{GapError, GapTracker};
pub use gauges::GaugeUpdater;
pub use poller::{PollState, Poller, should_advance};
