//! This module provides the `SupervisorBuilder` for constructing a `Supervisor`.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use tokio_util::sync::CancellationToken;

use super::{Supervisor, SupervisorError};
use crate::{
    config::AppConfig,
    engine::{CorrelationEngine, CorrelationSettings, GapTracker, GaugeUpdater, Poller},
    metrics::MetricsSink,
    providers::{Sources, traits::{ConsensusSource, ExecutionSource}},
};

/// A builder for creating a `Supervisor` instance.
#[derive(Default)]
pub struct SupervisorBuilder {
    config: Option<AppConfig>,
    consensus: Option<Arc<dyn ConsensusSource>>,
    execution: Option<Arc<dyn ExecutionSource>>,
    metrics: Option<Arc<dyn MetricsSink>>,
    metrics_handle: Option<PrometheusHandle>,
    cancellation_token: Option<CancellationToken>,
}

impl SupervisorBuilder {
    /// Creates a new, empty `SupervisorBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the application configuration for the `Supervisor`.
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the consensus-layer source.
    pub fn consensus(mut self, consensus: Arc<dyn ConsensusSource>) -> Self {
        self.consensus = Some(consensus);
        self
    }

    /// Sets the execution-layer source.
    pub fn execution(mut self, execution: Arc<dyn ExecutionSource>) -> Self {
        self.execution = Some(execution);
        self
    }

    /// Sets both sources at once.
    pub fn sources(self, sources: Sources) -> Self {
        self.consensus(sources.consensus).execution(sources.execution)
    }

    /// Sets the sink every service writes metrics to.
    pub fn metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Sets the Prometheus handle served on `/metrics`.
    pub fn metrics_handle(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    /// Uses an externally owned cancellation token instead of a fresh one.
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Assembles and validates the components to build a `Supervisor`.
    ///
    /// The correlation engine, the polling loop and the gauge updaters are
    /// constructed here so that they share the same sources and sink.
    pub fn build(self) -> Result<Supervisor, SupervisorError> {
        let config = self.config.ok_or(SupervisorError::MissingConfig)?;
        let consensus = self.consensus.ok_or(SupervisorError::MissingConsensusSource)?;
        let execution = self.execution.ok_or(SupervisorError::MissingExecutionSource)?;
        let metrics = self.metrics.ok_or(SupervisorError::MissingMetricsSink)?;
        let cancellation_token = self.cancellation_token.unwrap_or_default();

        let gap_tracker = GapTracker::new(Arc::clone(&consensus), Arc::clone(&execution));
        let engine = CorrelationEngine::new(
            CorrelationSettings::from(&config),
            Arc::clone(&consensus),
            execution,
            gap_tracker.clone(),
            Arc::clone(&metrics),
        );
        let poller = Poller::new(
            engine,
            Arc::clone(&consensus),
            Arc::clone(&metrics),
            config.polling_interval_ms,
            config.error_backoff_ms,
            cancellation_token.clone(),
        );
        let gauges = GaugeUpdater::new(
            consensus,
            gap_tracker,
            metrics,
            config.metrics_update_interval_secs,
            cancellation_token.clone(),
        );

        Ok(Supervisor::new(
            Arc::new(config),
            poller,
            gauges,
            self.metrics_handle,
            cancellation_token,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        http_client::FetchError,
        providers::traits::{MockConsensusSource, MockExecutionSource},
        test_helpers::RecordingMetrics,
    };

    fn failing_sources() -> (Arc<dyn ConsensusSource>, Arc<dyn ExecutionSource>) {
        let mut consensus = MockConsensusSource::new();
        consensus
            .expect_current_height()
            .returning(|| Err(FetchError::Network("connection refused".into())));
        let mut execution = MockExecutionSource::new();
        execution
            .expect_current_height()
            .returning(|| Err(FetchError::Network("connection refused".into())));
        (Arc::new(consensus), Arc::new(execution))
    }

    #[test]
    fn build_fails_if_config_is_missing() {
        let (consensus, execution) = failing_sources();
        let result = SupervisorBuilder::new()
            .consensus(consensus)
            .execution(execution)
            .metrics(Arc::new(RecordingMetrics::default()))
            .build();
        assert!(matches!(result, Err(SupervisorError::MissingConfig)));
    }

    #[test]
    fn build_fails_if_sources_are_missing() {
        let (consensus, _) = failing_sources();
        let result = SupervisorBuilder::new()
            .config(AppConfig::builder().build())
            .consensus(consensus)
            .metrics(Arc::new(RecordingMetrics::default()))
            .build();
        assert!(matches!(result, Err(SupervisorError::MissingExecutionSource)));

        let result = SupervisorBuilder::new()
            .config(AppConfig::builder().build())
            .metrics(Arc::new(RecordingMetrics::default()))
            .build();
        assert!(matches!(result, Err(SupervisorError::MissingConsensusSource)));
    }

    #[test]
    fn build_fails_if_metrics_sink_is_missing() {
        let (consensus, execution) = failing_sources();
        let result = SupervisorBuilder::new()
            .config(AppConfig::builder().build())
            .consensus(consensus)
            .execution(execution)
            .build();
        assert!(matches!(result, Err(SupervisorError::MissingMetricsSink)));
    }

    #[tokio::test]
    async fn run_stops_when_token_is_cancelled() {
        let (consensus, execution) = failing_sources();
        let metrics = Arc::new(RecordingMetrics::default());
        let token = CancellationToken::new();
        let supervisor = SupervisorBuilder::new()
            .config(AppConfig::builder().metrics_enabled(false).error_backoff(10).build())
            .consensus(consensus)
            .execution(execution)
            .metrics(metrics.clone())
            .cancellation_token(token.clone())
            .build()
            .unwrap();

        let handle = tokio::spawn(supervisor.run());
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();

        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("supervisor did not shut down")
            .unwrap();
        assert!(result.is_ok());
        assert!(metrics.counter(crate::metrics::BlockCounter::Errors) >= 1);
    }
}
