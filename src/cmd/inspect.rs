//! One-shot correlation of a single consensus block, printed as JSON.

use std::sync::Arc;

use clap::Parser;
use thiserror::Error;

use crate::{
    config::AppConfig,
    engine::{Correlation, CorrelationEngine, CorrelationSettings, GapTracker, ProcessError},
    http_client::{FetchError, HttpClientError},
    metrics::PrometheusSink,
    providers::Sources,
};

/// Errors surfaced by the `inspect` subcommand.
#[derive(Error, Debug)]
pub enum InspectError {
    /// The shared HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] HttpClientError),
    /// The consensus height or block could not be read.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
    /// The correlation attempt failed.
    #[error("Processing error: {0}")]
    Process(#[from] ProcessError),
    /// The outcome could not be rendered.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Arguments of the `inspect` subcommand.
#[derive(Parser, Debug, Clone, Default)]
pub struct InspectArgs {
    /// Consensus height to inspect. Defaults to the current head.
    #[arg(long)]
    pub height: Option<i64>,
    /// Execution height of the previous match, used to pick the search window.
    #[arg(long, default_value_t = 0)]
    pub last_found: i64,
}

/// Correlates one block and returns the outcome.
pub async fn inspect(
    config: &AppConfig,
    sources: Sources,
    args: &InspectArgs,
) -> Result<Correlation, InspectError> {
    let height = match args.height {
        Some(height) => height,
        None => sources.consensus.current_height().await?,
    };
    tracing::debug!(height, last_found = args.last_found, "Inspecting block.");
    let block = sources.consensus.fetch_block(height).await?;

    let gap_tracker =
        GapTracker::new(Arc::clone(&sources.consensus), Arc::clone(&sources.execution));
    let mut engine = CorrelationEngine::new(
        CorrelationSettings::from(config),
        sources.consensus,
        sources.execution,
        gap_tracker,
        Arc::new(PrometheusSink::new()),
    )
    .with_last_found_el_height(args.last_found);

    Ok(engine.process_block(&block).await?)
}

/// Entry point of the `inspect` subcommand.
pub async fn execute(config: AppConfig, args: InspectArgs) -> Result<(), InspectError> {
    let sources = Sources::from_config(&config)?;
    let outcome = inspect(&config, sources, &args).await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
