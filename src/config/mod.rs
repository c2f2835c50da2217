//! Configuration module for the exporter.

mod app_config;
mod helpers;
mod http_base;
mod http_retry;
mod log;
mod rpc_retry;
mod server;

pub use app_config::AppConfig;
pub use helpers::{
    deserialize_duration_from_ms, deserialize_duration_from_seconds, serialize_duration_to_ms,
    serialize_duration_to_seconds,
};
pub use http_base::BaseHttpClientConfig;
pub use http_retry::{HttpRetryConfig, JitterSetting};
pub use log::{LogConfig, LogFormat};
pub use rpc_retry::RpcRetryConfig;
pub use server::MetricsServerConfig;
