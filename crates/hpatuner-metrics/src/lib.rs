//! hpatuner-metrics: error-rate observations over HTTP.
//!
//! Performs a single bounded GET against a tuner's metric endpoint and
//! decodes the JSON payload. There is no caching and no retry: every
//! reconciliation pass observes a fresh value, and failures are left to
//! the controller's backoff.
//!
//! # Payload
//!
//! ```text
//! GET http://metrics.prod:8080/error-rate
//! 200 OK
//! {"error_rate": 7.25, "message": "ok"}
//! ```
//!
//! Only `error_rate` is read. A payload without it is rejected rather
//! than read as zero, so a broken exporter never looks healthy.

pub mod error;
pub mod fetcher;

pub use error::{MetricFetchError, MetricResult};
pub use fetcher::{decode_error_rate, MetricFetcher};
