//! The `HpaTuner` custom resource.
//!
//! An `HpaTuner` names a target HorizontalPodAutoscaler, an HTTP endpoint
//! reporting an error rate, and a threshold. When the observed rate breaches
//! the threshold the controller widens the HPA's replica bounds up to
//! `hpaMaxReplicas`.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::types::ObjectKey;

/// API group of the `HpaTuner` resource.
pub const API_GROUP: &str = "mycrds.akmusa.com";

/// API version of the `HpaTuner` resource.
pub const API_VERSION: &str = "v1alpha1";

/// Desired state of an `HpaTuner`. Read-only to the controller.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, PartialEq, JsonSchema)]
#[kube(
    group = "mycrds.akmusa.com",
    version = "v1alpha1",
    kind = "HpaTuner",
    plural = "hpatuners",
    namespaced
)]
#[kube(status = "HpaTunerStatus")]
#[kube(printcolumn = r#"{"name":"HPA","type":"string","jsonPath":".spec.hpaName"}"#)]
#[kube(printcolumn = r#"{"name":"Min","type":"integer","jsonPath":".status.lastObservedMin"}"#)]
#[kube(printcolumn = r#"{"name":"Max","type":"integer","jsonPath":".status.lastObservedMax"}"#)]
#[kube(printcolumn = r#"{"name":"ErrorRate","type":"string","jsonPath":".status.lastMetricValue"}"#)]
#[serde(rename_all = "camelCase")]
pub struct HpaTunerSpec {
    /// Name of the target HorizontalPodAutoscaler.
    pub hpa_name: String,

    /// Namespace of the target HorizontalPodAutoscaler.
    pub hpa_namespace: String,

    /// `http://` URI returning `{"error_rate": <number>}`.
    pub metric_endpoint: String,

    /// Error rate above which the HPA bounds are widened.
    pub metric_threshold: i64,

    /// Ceiling for the HPA's `maxReplicas`.
    #[serde(rename = "hpaMaxReplicas")]
    #[schemars(range(min = 1))]
    pub max_ceiling_replicas: i32,
}

/// Observed state of an `HpaTuner`. Written only by the controller.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HpaTunerStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_observed_min: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_observed_max: Option<i32>,

    /// Last observed error rate, two decimals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_metric_value: Option<String>,

    /// RFC 3339 timestamp of the last observation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<String>,
}

impl HpaTuner {
    /// Identity of the HPA this tuner targets.
    pub fn target_key(&self) -> ObjectKey {
        ObjectKey::new(&self.spec.hpa_namespace, &self.spec.hpa_name)
    }
}
