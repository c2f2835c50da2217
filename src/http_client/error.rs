use thiserror::Error;

/// Errors surfaced by upstream fetches once the retry budget is spent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Transport failure, timeout or non-success HTTP status.
    #[error("Network error: {0}")]
    Network(String),

    /// A numeric, hex or JSON field could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The response failed sanity checks (too short, empty proposer or hash).
    #[error("Invalid block: {0}")]
    InvalidBlock(String),

    /// No block exists at the requested height.
    #[error("Block not found: {0}")]
    NotFound(String),
}

impl FetchError {
    /// Whether another attempt may succeed where this one failed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Network(_) | FetchError::InvalidBlock(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.to_string())
    }
}

/// Errors that can occur while constructing the shared HTTP client.
#[derive(Debug, Error)]
pub enum HttpClientError {
    /// An error occurred while building the underlying `reqwest::Client`.
    #[error("Failed to create HTTP client: {0}")]
    Build(String),
}
