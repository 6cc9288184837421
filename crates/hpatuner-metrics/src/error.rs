//! Metric fetch error types.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for metric fetches.
pub type MetricResult<T> = Result<T, MetricFetchError>;

/// Errors that can occur while observing a metric endpoint.
#[derive(Debug, Error)]
pub enum MetricFetchError {
    #[error("invalid metric endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("metric request failed: {0}")]
    Request(String),

    #[error("metric endpoint returned HTTP {0}")]
    Status(u16),

    #[error("failed to read metric response body: {0}")]
    Body(String),

    #[error("failed to decode metric payload: {0}")]
    Decode(String),

    #[error("metric request timed out after {0:?}")]
    Timeout(Duration),
}
