use std::{collections::HashMap, sync::Mutex};

use crate::metrics::{BlockCounter, BlockGauge, MetricsSink};

/// An in-memory `MetricsSink` that records every write for assertions.
#[derive(Debug, Default)]
pub struct RecordingMetrics {
    counters: Mutex<HashMap<BlockCounter, u64>>,
    gauges: Mutex<HashMap<BlockGauge, f64>>,
}

impl RecordingMetrics {
    /// Current value of `counter` (0 if never incremented).
    pub fn counter(&self, counter: BlockCounter) -> u64 {
        self.counters.lock().map(|c| c.get(&counter).copied().unwrap_or(0)).unwrap_or(0)
    }

    /// Last value written to `gauge`, if any.
    pub fn gauge(&self, gauge: BlockGauge) -> Option<f64> {
        self.gauges.lock().ok().and_then(|g| g.get(&gauge).copied())
    }

    /// No counter or gauge has been written.
    pub fn is_untouched(&self) -> bool {
        let counters_empty = self.counters.lock().map(|c| c.is_empty()).unwrap_or(false);
        let gauges_empty = self.gauges.lock().map(|g| g.is_empty()).unwrap_or(false);
        counters_empty && gauges_empty
    }
}

impl MetricsSink for RecordingMetrics {
    fn increment(&self, counter: BlockCounter) {
        if let Ok(mut counters) = self.counters.lock() {
            *counters.entry(counter).or_default() += 1;
        }
    }

    fn set(&self, gauge: BlockGauge, value: f64) {
        if let Ok(mut gauges) = self.gauges.lock() {
            gauges.insert(gauge, value);
        }
    }
}
