//! Lifecycle events emitted for every reconciliation pass.
//!
//! Each event carries typed context (target identity, bounds, observed
//! rate) rendered both as a human-readable note and as key-value fields,
//! so an audit trail of events alone reconstructs what a pass did.

use std::future::Future;

use hpatuner_api::{HpaTuner, ObjectKey, ReplicaBounds};

/// Event severity, mirroring Kubernetes `Normal` / `Warning`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Normal,
    Warning,
}

/// Something worth recording against an `HpaTuner`.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    /// A pass started.
    Reconciling { tuner: ObjectKey },
    /// The observed rate exceeded the threshold.
    ThresholdBreached {
        target: ObjectKey,
        error_rate: f64,
        threshold: i64,
        current: ReplicaBounds,
        desired: ReplicaBounds,
    },
    /// New bounds were applied to the target.
    HpaUpdated {
        target: ObjectKey,
        from: ReplicaBounds,
        to: ReplicaBounds,
    },
    /// Applying new bounds failed.
    UpdateFailed {
        target: ObjectKey,
        desired: ReplicaBounds,
        error: String,
    },
    /// A pass finished.
    ReconciliationComplete {
        tuner: ObjectKey,
        bounds: ReplicaBounds,
        error_rate: f64,
    },
}

impl LifecycleEvent {
    pub fn severity(&self) -> Severity {
        match self {
            LifecycleEvent::UpdateFailed { .. } => Severity::Warning,
            _ => Severity::Normal,
        }
    }

    /// Machine-readable reason code.
    pub fn reason(&self) -> &'static str {
        match self {
            LifecycleEvent::Reconciling { .. } => "Reconciling",
            LifecycleEvent::ThresholdBreached { .. } => "ThresholdBreached",
            LifecycleEvent::HpaUpdated { .. } => "HPAUpdated",
            LifecycleEvent::UpdateFailed { .. } => "UpdateFailed",
            LifecycleEvent::ReconciliationComplete { .. } => "ReconciliationComplete",
        }
    }

    /// The operation this event belongs to.
    pub fn action(&self) -> &'static str {
        match self {
            LifecycleEvent::HpaUpdated { .. } | LifecycleEvent::UpdateFailed { .. } => "UpdateHPA",
            _ => "Reconcile",
        }
    }

    /// Human-readable description.
    pub fn note(&self) -> String {
        match self {
            LifecycleEvent::Reconciling { tuner } => {
                format!("Starting reconciliation for resource {}", tuner.name)
            }
            LifecycleEvent::ThresholdBreached {
                target,
                error_rate,
                threshold,
                current,
                desired,
            } => {
                if current == desired {
                    format!(
                        "Error rate {error_rate:.2} exceeds threshold {threshold}; HPA {target} already at {desired}"
                    )
                } else {
                    format!(
                        "Error rate {error_rate:.2} exceeds threshold {threshold}; updating HPA {target} (min: {}->{}, max: {}->{})",
                        current.min, desired.min, current.max, desired.max
                    )
                }
            }
            LifecycleEvent::HpaUpdated { target, from, to } => {
                format!("Successfully updated HPA {target} from {from} to {to}")
            }
            LifecycleEvent::UpdateFailed {
                target,
                desired,
                error,
            } => format!("Failed to update HPA {target} to {desired}: {error}"),
            LifecycleEvent::ReconciliationComplete {
                tuner,
                bounds,
                error_rate,
            } => format!(
                "Successfully reconciled resource {} (bounds {bounds}, error rate {error_rate:.2})",
                tuner.name
            ),
        }
    }

    /// Structured context as key-value pairs.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            LifecycleEvent::Reconciling { tuner } => vec![("tuner", tuner.to_string())],
            LifecycleEvent::ThresholdBreached {
                target,
                error_rate,
                threshold,
                current,
                desired,
            } => vec![
                ("target", target.to_string()),
                ("error_rate", format!("{error_rate:.2}")),
                ("threshold", threshold.to_string()),
                ("current_min", current.min.to_string()),
                ("current_max", current.max.to_string()),
                ("desired_min", desired.min.to_string()),
                ("desired_max", desired.max.to_string()),
            ],
            LifecycleEvent::HpaUpdated { target, from, to } => vec![
                ("target", target.to_string()),
                ("old_min", from.min.to_string()),
                ("old_max", from.max.to_string()),
                ("new_min", to.min.to_string()),
                ("new_max", to.max.to_string()),
            ],
            LifecycleEvent::UpdateFailed {
                target,
                desired,
                error,
            } => vec![
                ("target", target.to_string()),
                ("desired_min", desired.min.to_string()),
                ("desired_max", desired.max.to_string()),
                ("error", error.clone()),
            ],
            LifecycleEvent::ReconciliationComplete {
                tuner,
                bounds,
                error_rate,
            } => vec![
                ("tuner", tuner.to_string()),
                ("min", bounds.min.to_string()),
                ("max", bounds.max.to_string()),
                ("error_rate", format!("{error_rate:.2}")),
            ],
        }
    }
}

/// Fire-and-forget event sink. Implementations log and swallow their own
/// delivery failures.
pub trait EventSink: Send + Sync {
    fn publish(
        &self,
        tuner: &HpaTuner,
        event: &LifecycleEvent,
    ) -> impl Future<Output = ()> + Send;
}
