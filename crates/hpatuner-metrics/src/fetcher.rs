//! HTTP metric fetcher.
//!
//! One GET per call, bounded by a timeout. The response body is always
//! collected in full before the status is inspected, so the pooled
//! connection is returned clean on every path.

use std::time::Duration;

use bytes::Bytes;
use http::header::{ACCEPT, USER_AGENT};
use http::{Method, Request, Uri};
use http_body_util::{BodyExt, Empty, Limited};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde::Deserialize;
use tracing::debug;

use crate::error::{MetricFetchError, MetricResult};

/// Default deadline for a single metric fetch.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Largest metric response body accepted, in bytes.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Wire shape of the metric endpoint's response. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct ErrorRatePayload {
    error_rate: f64,
}

/// Fetches error-rate observations from HTTP endpoints.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct MetricFetcher {
    client: Client<HttpConnector, Empty<Bytes>>,
    timeout: Duration,
}

impl MetricFetcher {
    /// Create a fetcher with the given per-request deadline.
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new()).build_http();
        Self { client, timeout }
    }

    /// Per-request deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch the current error rate from `endpoint`.
    pub async fn fetch_error_rate(&self, endpoint: &str) -> MetricResult<f64> {
        let uri = parse_endpoint(endpoint)?;

        let req = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(USER_AGENT, concat!("hpatuner/", env!("CARGO_PKG_VERSION")))
            .header(ACCEPT, "application/json")
            .body(Empty::<Bytes>::new())
            .map_err(|e| MetricFetchError::Request(e.to_string()))?;

        let (status, body) = tokio::time::timeout(self.timeout, async {
            let resp = self
                .client
                .request(req)
                .await
                .map_err(|e| MetricFetchError::Request(e.to_string()))?;
            let status = resp.status();
            let body = Limited::new(resp.into_body(), MAX_BODY_BYTES)
                .collect()
                .await
                .map_err(|e| MetricFetchError::Body(e.to_string()))?
                .to_bytes();
            Ok::<_, MetricFetchError>((status, body))
        })
        .await
        .map_err(|_| MetricFetchError::Timeout(self.timeout))??;

        if !status.is_success() {
            debug!(%endpoint, %status, "metric endpoint returned non-2xx");
            return Err(MetricFetchError::Status(status.as_u16()));
        }

        let rate = decode_error_rate(&body)?;
        debug!(%endpoint, error_rate = rate, "metric fetched");
        Ok(rate)
    }
}

impl Default for MetricFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

/// Decode an error-rate payload. The `error_rate` field is required.
pub fn decode_error_rate(body: &[u8]) -> MetricResult<f64> {
    let payload: ErrorRatePayload =
        serde_json::from_slice(body).map_err(|e| MetricFetchError::Decode(e.to_string()))?;
    Ok(payload.error_rate)
}

/// Parse and validate an endpoint URI. Only plain `http://` is supported.
fn parse_endpoint(endpoint: &str) -> MetricResult<Uri> {
    let invalid = |reason: &str| MetricFetchError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: reason.to_string(),
    };

    let uri: Uri = endpoint.trim().parse().map_err(|_| invalid("not a valid URI"))?;
    match uri.scheme_str() {
        Some("http") => {}
        Some(_) => return Err(invalid("only http:// endpoints are supported")),
        None => return Err(invalid("missing scheme")),
    }
    if uri.host().is_none() {
        return Err(invalid("missing host"));
    }
    Ok(uri)
}
