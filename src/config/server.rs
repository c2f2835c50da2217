use serde::Deserialize;

/// Configuration for the metrics exposition server.
#[derive(Debug, Deserialize, Clone)]
pub struct MetricsServerConfig {
    /// Address and port for the HTTP server to listen on.
    #[serde(default = "default_metrics_listen_address")]
    pub listen_address: String,

    /// Whether the exposition server is started at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for MetricsServerConfig {
    fn default() -> Self {
        Self { listen_address: default_metrics_listen_address(), enabled: default_enabled() }
    }
}

/// Provides the default value for metrics.listen_address.
fn default_metrics_listen_address() -> String {
    "0.0.0.0:2113".to_string()
}

fn default_enabled() -> bool {
    true
}
