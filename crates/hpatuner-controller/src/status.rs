//! Status recorder: writes the latest observation onto an `HpaTuner`.

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, error};

use hpatuner_api::{HpaTunerStatus, ObjectKey, ReplicaBounds};

use crate::store::ObjectStore;

/// Render an error rate the way it is stored in `lastMetricValue`.
pub fn format_metric_value(error_rate: f64) -> String {
    format!("{error_rate:.2}")
}

/// Build the status for an observation made at `now`.
pub fn observed_status(bounds: ReplicaBounds, error_rate: f64, now: DateTime<Utc>) -> HpaTunerStatus {
    HpaTunerStatus {
        last_observed_min: Some(bounds.min),
        last_observed_max: Some(bounds.max),
        last_metric_value: Some(format_metric_value(error_rate)),
        last_update_time: Some(now.to_rfc3339_opts(SecondsFormat::Secs, true)),
    }
}

/// Persist the observation. Failures are logged and reported as `false`;
/// they never fail the pass.
pub async fn record_status<S: ObjectStore>(
    store: &S,
    key: &ObjectKey,
    bounds: ReplicaBounds,
    error_rate: f64,
) -> bool {
    let status = observed_status(bounds, error_rate, Utc::now());
    match store.update_tuner_status(key, &status).await {
        Ok(()) => {
            debug!(
                tuner = %key,
                min = bounds.min,
                max = bounds.max,
                error_rate = %format_metric_value(error_rate),
                "status recorded"
            );
            true
        }
        Err(e) => {
            error!(tuner = %key, error = %e, "failed to update status");
            false
        }
    }
}
