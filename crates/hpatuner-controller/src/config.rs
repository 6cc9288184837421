//! Immutable controller configuration, assembled once at startup and
//! handed to every collaborator.

use std::time::Duration;

use crate::autoscaler::FIELD_MANAGER;

/// Runtime settings for the controller and its collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    /// Namespace to watch for `HpaTuner`s; `None` watches all namespaces.
    pub namespace: Option<String>,
    /// Field manager for server-side apply.
    pub field_manager: String,
    /// Controller name reported on emitted events.
    pub reporter: String,
    /// Reporting instance (usually the pod name).
    pub instance: Option<String>,
    /// Delay before the next pass after a successful one.
    pub requeue_interval: Duration,
    /// Deadline for a single metric fetch.
    pub metric_timeout: Duration,
    /// Connect deadline for the Kubernetes API server. Reads keep the
    /// client default so long-polling watches stay open.
    pub api_timeout: Duration,
    /// First retry delay after a failed pass.
    pub backoff_base: Duration,
    /// Upper bound on the retry delay.
    pub backoff_max: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            field_manager: FIELD_MANAGER.to_string(),
            reporter: "hpatuner".to_string(),
            instance: None,
            requeue_interval: Duration::from_secs(30),
            metric_timeout: Duration::from_secs(10),
            api_timeout: Duration::from_secs(30),
            backoff_base: Duration::from_secs(5),
            backoff_max: Duration::from_secs(300),
        }
    }
}
