//! Collaborator seams used by the reconciler.
//!
//! The reconciler only talks to the outside world through these traits,
//! so every pass can be driven against in-memory fakes. `KubeStore` and
//! `MetricFetcher` are the production implementations.

use std::future::Future;

use hpatuner_api::{HpaTuner, HpaTunerStatus, ObjectKey, ReplicaBounds};
use hpatuner_metrics::{MetricFetcher, MetricResult};

use crate::autoscaler::TargetAutoscaler;
use crate::error::StoreResult;

/// Declarative object store: get, apply, and status-update.
pub trait ObjectStore: Send + Sync {
    /// Fetch an `HpaTuner`. Absent objects yield `StoreError::NotFound`.
    fn get_tuner(&self, key: &ObjectKey) -> impl Future<Output = StoreResult<HpaTuner>> + Send;

    /// Replace the status of an `HpaTuner` through its status subresource.
    fn update_tuner_status(
        &self,
        key: &ObjectKey,
        status: &HpaTunerStatus,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Fetch the target HPA. Absent objects yield `StoreError::NotFound`.
    fn get_autoscaler(
        &self,
        key: &ObjectKey,
    ) -> impl Future<Output = StoreResult<TargetAutoscaler>> + Send;

    /// Server-side apply `desired` onto the target HPA with forced
    /// ownership of the bound fields.
    fn apply_bounds(
        &self,
        target: &TargetAutoscaler,
        desired: ReplicaBounds,
    ) -> impl Future<Output = StoreResult<()>> + Send;
}

/// Source of error-rate observations.
pub trait MetricSource: Send + Sync {
    fn fetch_error_rate(&self, endpoint: &str) -> impl Future<Output = MetricResult<f64>> + Send;
}

impl MetricSource for MetricFetcher {
    async fn fetch_error_rate(&self, endpoint: &str) -> MetricResult<f64> {
        MetricFetcher::fetch_error_rate(self, endpoint).await
    }
}
