use thiserror::Error;

/// Failures talking to the upstream weather API.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, TLS, connection reset, ...).
    #[error("request to upstream weather API failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Upstream answered with a non-success status.
    #[error("upstream weather API returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The response body did not decode into the expected shape.
    #[error("failed to decode upstream payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// The payload decoded but carried a value we cannot use.
    #[error("unexpected upstream payload: {0}")]
    Payload(String),
}

/// Failure against the reading store.
#[derive(Debug, Error)]
#[error("storage failure: {0}")]
pub struct StoreError(#[from] sqlx::Error);
