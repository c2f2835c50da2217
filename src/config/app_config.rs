use std::{path::Path, time::Duration};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use url::Url;

use super::{
    BaseHttpClientConfig, HttpRetryConfig, LogConfig, MetricsServerConfig, RpcRetryConfig,
    deserialize_duration_from_ms, deserialize_duration_from_seconds,
};

/// Provides the default value for polling_interval_ms.
fn default_polling_interval() -> Duration {
    Duration::from_millis(500)
}

/// Provides the default value for error_backoff_ms.
fn default_error_backoff() -> Duration {
    Duration::from_secs(2)
}

/// Provides the default value for metrics_update_interval_secs.
fn default_metrics_update_interval() -> Duration {
    Duration::from_secs(5)
}

/// Provides the default value for shutdown_timeout_secs.
fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_search_offset() -> i64 {
    2
}

fn default_continuation_threshold() -> i64 {
    5
}

fn default_min_body_bytes() -> usize {
    100
}

/// Application configuration for the exporter.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Execution-layer address credited as block producer (coinbase) for the
    /// watched validator. Compared case-sensitively against the EIP-55
    /// checksummed coinbase.
    pub evm_address: String,

    /// Consensus-layer proposer address of the watched validator.
    pub target_validator: String,

    /// Consensus-layer RPC base URL (serves `/status` and `/block`).
    pub rpc_endpoint: Url,

    /// Execution-layer JSON-RPC URL.
    pub eth_endpoint: Url,

    /// Metrics exposition server configuration.
    #[serde(default)]
    pub metrics: MetricsServerConfig,

    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,

    /// Sleep between polling iterations.
    #[serde(
        default = "default_polling_interval",
        deserialize_with = "deserialize_duration_from_ms"
    )]
    pub polling_interval_ms: Duration,

    /// Sleep after a failed height read or block fetch.
    #[serde(default = "default_error_backoff", deserialize_with = "deserialize_duration_from_ms")]
    pub error_backoff_ms: Duration,

    /// Refresh period of the current-height and gap gauges.
    #[serde(
        default = "default_metrics_update_interval",
        deserialize_with = "deserialize_duration_from_seconds"
    )]
    pub metrics_update_interval_secs: Duration,

    /// Half-width of the execution-layer search window.
    #[serde(default = "default_search_offset")]
    pub search_offset: i64,

    /// Largest distance between the expected height and the last confirmed
    /// height for which the search continues from the last hit.
    #[serde(default = "default_continuation_threshold")]
    pub continuation_threshold: i64,

    /// Consensus block responses shorter than this are treated as suspicious.
    #[serde(default = "default_min_body_bytes")]
    pub min_body_bytes: usize,

    /// Retry policy for the current-height readers.
    #[serde(default = "HttpRetryConfig::exponential")]
    pub height_retry: HttpRetryConfig,

    /// Retry policy for consensus block fetches.
    #[serde(default = "HttpRetryConfig::block_fetch")]
    pub block_retry: HttpRetryConfig,

    /// Transport retry policy for execution-layer block RPC calls.
    #[serde(default)]
    pub rpc_retry: RpcRetryConfig,

    /// Configuration for the shared HTTP client.
    #[serde(default)]
    pub http_base: BaseHttpClientConfig,

    /// The maximum time to wait for supervised tasks during shutdown.
    #[serde(
        default = "default_shutdown_timeout",
        deserialize_with = "deserialize_duration_from_seconds"
    )]
    pub shutdown_timeout_secs: Duration,
}

impl AppConfig {
    /// Creates a new `AppConfig` by reading `app.yaml` from the configuration
    /// directory, overlaid with `EXPORTER__*` environment variables.
    pub fn new(config_dir: Option<&str>) -> Result<Self, ConfigError> {
        let config_dir_str = config_dir.unwrap_or("configs");
        let config_file = Path::new(config_dir_str).join("app.yaml");
        let s = Config::builder()
            .add_source(File::from(config_file))
            .add_source(Environment::with_prefix("EXPORTER").separator("__"))
            .build()?;
        let config: Self = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations the exporter cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.evm_address.trim().is_empty() {
            return Err(ConfigError::Message("evm_address is required".into()));
        }
        if self.target_validator.trim().is_empty() {
            return Err(ConfigError::Message("target_validator is required".into()));
        }
        if self.search_offset < 0 {
            return Err(ConfigError::Message("search_offset must not be negative".into()));
        }
        Ok(())
    }

    /// Creates a new `AppConfigBuilder` for testing purposes.
    #[cfg(test)]
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

/// A builder for creating `AppConfig` instances for testing.
#[cfg(test)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

#[cfg(test)]
impl Default for AppConfigBuilder {
    fn default() -> Self {
        Self {
            config: AppConfig {
                evm_address: "0x0000000000000000000000000000000000000001".to_string(),
                target_validator: "VALIDATOR".to_string(),
                rpc_endpoint: Url::parse("http://localhost:26657").unwrap(),
                eth_endpoint: Url::parse("http://localhost:8545").unwrap(),
                metrics: MetricsServerConfig::default(),
                log: LogConfig::default(),
                polling_interval_ms: default_polling_interval(),
                error_backoff_ms: default_error_backoff(),
                metrics_update_interval_secs: default_metrics_update_interval(),
                search_offset: default_search_offset(),
                continuation_threshold: default_continuation_threshold(),
                min_body_bytes: default_min_body_bytes(),
                height_retry: HttpRetryConfig::exponential(),
                block_retry: HttpRetryConfig::block_fetch(),
                rpc_retry: RpcRetryConfig::default(),
                http_base: BaseHttpClientConfig::default(),
                shutdown_timeout_secs: default_shutdown_timeout(),
            },
        }
    }
}

#[cfg(test)]
impl AppConfigBuilder {
    pub fn evm_address(mut self, address: &str) -> Self {
        self.config.evm_address = address.to_string();
        self
    }

    pub fn target_validator(mut self, validator: &str) -> Self {
        self.config.target_validator = validator.to_string();
        self
    }

    pub fn rpc_endpoint(mut self, url: &str) -> Self {
        self.config.rpc_endpoint = Url::parse(url).unwrap();
        self
    }

    pub fn eth_endpoint(mut self, url: &str) -> Self {
        self.config.eth_endpoint = Url::parse(url).unwrap();
        self
    }

    pub fn metrics_enabled(mut self, enabled: bool) -> Self {
        self.config.metrics.enabled = enabled;
        self
    }

    pub fn polling_interval(mut self, interval_ms: u64) -> Self {
        self.config.polling_interval_ms = Duration::from_millis(interval_ms);
        self
    }

    pub fn error_backoff(mut self, backoff_ms: u64) -> Self {
        self.config.error_backoff_ms = Duration::from_millis(backoff_ms);
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}
