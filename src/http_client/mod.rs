//! Shared HTTP client with bounded, per-call-site retries for upstream fetches.

mod client;
mod error;

pub use client::{FetchOptions, ResilientClient, build_retry_policy};
pub use error::{FetchError, HttpClientError};
