#![warn(missing_docs)]
//! A Prometheus exporter that correlates the consensus-layer blocks proposed by
//! one validator with the execution-layer blocks it produced.

pub mod cmd;
pub mod config;
pub mod engine;
pub mod http_client;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod providers;
pub mod supervisor;
pub mod test_helpers;
