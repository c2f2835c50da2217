use std::sync::Arc;

use clap::{Parser, Subcommand};
use validator_exporter::{
    cmd::{InspectArgs, inspect},
    config::AppConfig,
    logging::init_tracing,
    metrics::{PrometheusSink, install_prometheus_recorder},
    providers::Sources,
    supervisor::Supervisor,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing `app.yaml`.
    #[arg(long, global = true, env = "EXPORTER_CONFIG_DIR", default_value = "configs")]
    config_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs the exporter until interrupted.
    Run,
    /// Correlates a single consensus block and prints the outcome.
    Inspect(InspectArgs),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = AppConfig::new(Some(&cli.config_dir))?;
    // `inspect` prints its report on stdout.
    let log_config = match cli.command {
        Commands::Run => config.log.clone(),
        Commands::Inspect(_) => config.log.clone().console_to_stderr(),
    };
    init_tracing(&log_config)?;
    tracing::debug!(
        rpc_endpoint = %config.rpc_endpoint,
        eth_endpoint = %config.eth_endpoint,
        target_validator = %config.target_validator,
        "Configuration loaded."
    );

    match cli.command {
        Commands::Run => run_supervisor(config).await?,
        Commands::Inspect(args) => inspect::execute(config, args).await?,
    }

    Ok(())
}

async fn run_supervisor(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let metrics_handle = install_prometheus_recorder()?;
    tracing::debug!("Prometheus recorder installed.");

    let sources = Sources::from_config(&config)?;
    tracing::info!(
        retry_policy = ?config.rpc_retry,
        "Consensus and execution sources initialized."
    );

    let supervisor = Supervisor::builder()
        .config(config)
        .sources(sources)
        .metrics(Arc::new(PrometheusSink::new()))
        .metrics_handle(metrics_handle)
        .build()?;

    tracing::info!("Supervisor initialized, starting exporter...");
    supervisor.run().await?;

    Ok(())
}
