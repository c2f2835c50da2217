//! The Supervisor module manages the lifecycle of the exporter.
//!
//! It owns every long-running service (the polling loop, the two gauge
//! updaters, the metrics server and the signal listener), runs them on one
//! `JoinSet` sharing a single `CancellationToken`, and coordinates shutdown.
//!
//! ## Responsibilities
//!
//! - **Initialization**: The `SupervisorBuilder` wires the sources, the
//!   correlation engine and the metrics sink together.
//! - **Graceful Shutdown**: SIGINT or SIGTERM cancels the shared token; every
//!   service exits at its next suspension point and the supervisor waits up
//!   to `shutdown_timeout_secs` before aborting stragglers.
//! - **Task Supervision**: If a service panics, the supervisor cancels the
//!   rest so the process exits instead of running partially.

mod builder;

use std::{sync::Arc, time::Duration};

pub use builder::SupervisorBuilder;
use metrics_exporter_prometheus::PrometheusHandle;
use thiserror::Error;
use tokio::{net::TcpListener, signal, task::JoinSet};
use tokio_util::sync::CancellationToken;

use crate::{
    config::AppConfig,
    engine::{GaugeUpdater, Poller},
    metrics::server,
};

/// Represents the set of errors that can occur during the supervisor's
/// operation.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// A required configuration was not provided to the `SupervisorBuilder`.
    #[error("Missing configuration for Supervisor")]
    MissingConfig,

    /// A consensus source was not provided to the `SupervisorBuilder`.
    #[error("Missing consensus source for Supervisor")]
    MissingConsensusSource,

    /// An execution source was not provided to the `SupervisorBuilder`.
    #[error("Missing execution source for Supervisor")]
    MissingExecutionSource,

    /// A metrics sink was not provided to the `SupervisorBuilder`.
    #[error("Missing metrics sink for Supervisor")]
    MissingMetricsSink,

    /// The metrics server could not bind its listen address.
    #[error("Failed to bind metrics server to {address}: {source}")]
    Bind {
        /// The configured listen address.
        address: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A supervised task panicked.
    #[error("A supervised task failed: {0}")]
    TaskFailed(String),
}

/// The primary runtime manager for the exporter.
pub struct Supervisor {
    /// Shared application configuration.
    config: Arc<AppConfig>,

    /// The polling loop; owns the correlation engine.
    poller: Poller,

    /// Refreshes the height and gap gauges.
    gauges: GaugeUpdater,

    /// Render handle for the metrics server, if one should be started.
    metrics_handle: Option<PrometheusHandle>,

    /// A token used to signal a graceful shutdown to all supervised tasks.
    cancellation_token: CancellationToken,

    /// A set of all spawned tasks that the supervisor is actively managing.
    join_set: JoinSet<()>,
}

impl Supervisor {
    /// Creates a new Supervisor. Normally called by `SupervisorBuilder`.
    pub fn new(
        config: Arc<AppConfig>,
        poller: Poller,
        gauges: GaugeUpdater,
        metrics_handle: Option<PrometheusHandle>,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            config,
            poller,
            gauges,
            metrics_handle,
            cancellation_token,
            join_set: JoinSet::new(),
        }
    }

    /// Returns a new `SupervisorBuilder` instance.
    pub fn builder() -> SupervisorBuilder {
        SupervisorBuilder::new()
    }

    /// Starts all services and blocks until shutdown completes.
    pub async fn run(self) -> Result<(), SupervisorError> {
        let Self { config, poller, gauges, metrics_handle, cancellation_token, mut join_set } =
            self;

        join_set.spawn(listen_for_signals(cancellation_token.clone()));

        if config.metrics.enabled {
            match metrics_handle {
                Some(handle) => {
                    let address = config.metrics.listen_address.clone();
                    let listener = TcpListener::bind(&address)
                        .await
                        .map_err(|source| SupervisorError::Bind { address, source })?;
                    let token = cancellation_token.clone();
                    join_set.spawn(async move {
                        if let Err(e) = server::serve(listener, handle, token).await {
                            tracing::error!(error = %e, "Metrics server failed.");
                        }
                    });
                }
                None => {
                    tracing::warn!("Metrics server enabled but no recorder handle was provided.")
                }
            }
        }

        join_set.spawn(poller.run());
        join_set.spawn(gauges.clone().run_height());
        join_set.spawn(gauges.run_gap());
        tracing::info!(
            target_validator = %config.target_validator,
            evm_address = %config.evm_address,
            "Exporter started."
        );

        let mut failure = None;
        loop {
            tokio::select! {
                maybe_result = join_set.join_next() => {
                    match maybe_result {
                        Some(Ok(())) => {}
                        Some(Err(e)) => {
                            tracing::error!(
                                error = ?e,
                                "A critical task failed. Initiating shutdown."
                            );
                            failure.get_or_insert_with(|| e.to_string());
                            cancellation_token.cancel();
                        }
                        None => break,
                    }
                }
                _ = cancellation_token.cancelled() => break,
            }
        }

        drain(join_set, config.shutdown_timeout_secs).await;
        tracing::info!("Supervisor shutdown complete.");

        match failure {
            Some(reason) => Err(SupervisorError::TaskFailed(reason)),
            None => Ok(()),
        }
    }
}

/// Waits for supervised tasks to finish, aborting whatever is left after
/// `timeout`.
async fn drain(mut join_set: JoinSet<()>, timeout: Duration) {
    let wait_all = async {
        while let Some(result) = join_set.join_next().await {
            if let Err(e) = result {
                tracing::error!(error = ?e, "Task failed during shutdown.");
            }
        }
    };

    if tokio::time::timeout(timeout, wait_all).await.is_err() {
        tracing::warn!(?timeout, "Tasks did not stop within the shutdown timeout. Aborting.");
        join_set.shutdown().await;
    } else {
        tracing::info!("All supervised tasks have completed.");
    }
}

/// Cancels `token` on SIGINT or SIGTERM; returns early if it is cancelled
/// elsewhere.
async fn listen_for_signals(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for SIGINT.");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to register SIGTERM handler.");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("SIGINT (Ctrl+C) received, initiating graceful shutdown."),
        _ = terminate => tracing::info!("SIGTERM received, initiating graceful shutdown."),
        _ = token.cancelled() => return,
    }

    token.cancel();
}
