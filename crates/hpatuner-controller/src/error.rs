//! Controller error types.

use thiserror::Error;

use hpatuner_api::ObjectKey;
use hpatuner_metrics::MetricFetchError;

/// Result type alias for object store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for reconciliation passes.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Errors returned by the object store.
///
/// `NotFound` and `Conflict` are expected outcomes the orchestrator
/// handles itself; the rest are surfaced to the scheduler.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(ObjectKey),

    #[error("conflicting write on {key}: {message}")]
    Conflict { key: ObjectKey, message: String },

    #[error("object {key} is malformed: {reason}")]
    Malformed { key: ObjectKey, reason: String },

    #[error("api request failed: {0}")]
    Transport(String),
}

impl StoreError {
    /// Classify a kube client error for `key`.
    pub fn from_kube(err: kube::Error, key: &ObjectKey) -> Self {
        match err {
            kube::Error::Api(resp) if resp.code == 404 => StoreError::NotFound(key.clone()),
            kube::Error::Api(resp) if resp.code == 409 => StoreError::Conflict {
                key: key.clone(),
                message: resp.message,
            },
            other => StoreError::Transport(other.to_string()),
        }
    }
}

/// Errors surfaced by a reconciliation pass.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("object store error: {0}")]
    Store(#[from] StoreError),

    #[error("metric fetch failed: {0}")]
    Metric(#[from] MetricFetchError),

    #[error("reconciliation cancelled by shutdown")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::core::ErrorResponse;

    fn api_error(code: u16) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: format!("request failed with {code}"),
            reason: String::new(),
            code,
        })
    }

    #[test]
    fn classifies_not_found() {
        let key = ObjectKey::new("prod", "api");
        let err = StoreError::from_kube(api_error(404), &key);
        assert!(matches!(err, StoreError::NotFound(k) if k == key));
    }

    #[test]
    fn classifies_conflict() {
        let key = ObjectKey::new("prod", "api");
        let err = StoreError::from_kube(api_error(409), &key);
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[test]
    fn other_api_errors_are_transport() {
        let key = ObjectKey::new("prod", "api");
        let err = StoreError::from_kube(api_error(500), &key);
        assert!(matches!(err, StoreError::Transport(_)));
    }
}
