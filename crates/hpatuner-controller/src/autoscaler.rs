//! Autoscaler accessor: the slice of a HorizontalPodAutoscaler this
//! controller reads and the server-side-apply patch it writes.
//!
//! The patch carries identity, the unchanged `scaleTargetRef` (required
//! by API validation), and the two replica bounds. Nothing else, so the
//! field manager never claims `metrics`, `behavior`, or anything written by
//! the HPA controller or a human.

use k8s_openapi::api::autoscaling::v2::{
    CrossVersionObjectReference, HorizontalPodAutoscaler, HorizontalPodAutoscalerSpec,
};
use kube::api::ObjectMeta;

use hpatuner_api::{ObjectKey, ReplicaBounds};

use crate::error::{StoreError, StoreResult};

/// Field manager used for every server-side apply.
pub const FIELD_MANAGER: &str = "hpatuner-controller";

/// `minReplicas` as defaulted by the API server when unset.
const DEFAULT_MIN_REPLICAS: i32 = 1;

/// The fields of a target HPA the controller cares about.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetAutoscaler {
    pub key: ObjectKey,
    pub bounds: ReplicaBounds,
    pub scale_target_ref: CrossVersionObjectReference,
}

impl TargetAutoscaler {
    /// Extract the tuned fields from a live HPA.
    pub fn from_hpa(hpa: &HorizontalPodAutoscaler) -> StoreResult<Self> {
        let key = ObjectKey::from_resource(hpa);
        let spec = hpa.spec.as_ref().ok_or_else(|| StoreError::Malformed {
            key: key.clone(),
            reason: "missing spec".to_string(),
        })?;

        Ok(Self {
            bounds: ReplicaBounds {
                min: spec.min_replicas.unwrap_or(DEFAULT_MIN_REPLICAS),
                max: spec.max_replicas,
            },
            scale_target_ref: spec.scale_target_ref.clone(),
            key,
        })
    }

    /// Build the apply patch that sets `desired` on this HPA.
    pub fn bounds_patch(&self, desired: ReplicaBounds) -> HorizontalPodAutoscaler {
        HorizontalPodAutoscaler {
            metadata: ObjectMeta {
                name: Some(self.key.name.clone()),
                namespace: Some(self.key.namespace.clone()),
                ..Default::default()
            },
            spec: Some(HorizontalPodAutoscalerSpec {
                scale_target_ref: self.scale_target_ref.clone(),
                min_replicas: Some(desired.min),
                max_replicas: desired.max,
                metrics: None,
                behavior: None,
            }),
            status: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::autoscaling::v2::{MetricSpec, MetricTarget, ResourceMetricSource};
    use serde_json::json;

    fn deployment_ref() -> CrossVersionObjectReference {
        CrossVersionObjectReference {
            api_version: Some("apps/v1".to_string()),
            kind: "Deployment".to_string(),
            name: "api".to_string(),
        }
    }

    fn live_hpa(min: Option<i32>, max: i32) -> HorizontalPodAutoscaler {
        HorizontalPodAutoscaler {
            metadata: ObjectMeta {
                name: Some("api".to_string()),
                namespace: Some("prod".to_string()),
                resource_version: Some("42".to_string()),
                ..Default::default()
            },
            spec: Some(HorizontalPodAutoscalerSpec {
                scale_target_ref: deployment_ref(),
                min_replicas: min,
                max_replicas: max,
                metrics: Some(vec![MetricSpec {
                    type_: "Resource".to_string(),
                    resource: Some(ResourceMetricSource {
                        name: "cpu".to_string(),
                        target: MetricTarget {
                            type_: "Utilization".to_string(),
                            average_utilization: Some(70),
                            ..Default::default()
                        },
                    }),
                    ..Default::default()
                }]),
                behavior: None,
            }),
            status: None,
        }
    }

    #[test]
    fn reads_bounds_and_target_ref() {
        let target = TargetAutoscaler::from_hpa(&live_hpa(Some(2), 10)).unwrap();
        assert_eq!(target.key, ObjectKey::new("prod", "api"));
        assert_eq!(target.bounds, ReplicaBounds::new(2, 10));
        assert_eq!(target.scale_target_ref, deployment_ref());
    }

    #[test]
    fn unset_min_reads_as_api_default() {
        let target = TargetAutoscaler::from_hpa(&live_hpa(None, 5)).unwrap();
        assert_eq!(target.bounds, ReplicaBounds::new(1, 5));
    }

    #[test]
    fn missing_spec_is_malformed() {
        let mut hpa = live_hpa(Some(2), 10);
        hpa.spec = None;
        let err = TargetAutoscaler::from_hpa(&hpa).unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));
    }

    #[test]
    fn patch_carries_only_owned_fields() {
        let target = TargetAutoscaler::from_hpa(&live_hpa(Some(2), 10)).unwrap();
        let patch = target.bounds_patch(ReplicaBounds::new(4, 10));

        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({
                "apiVersion": "autoscaling/v2",
                "kind": "HorizontalPodAutoscaler",
                "metadata": { "name": "api", "namespace": "prod" },
                "spec": {
                    "scaleTargetRef": {
                        "apiVersion": "apps/v1",
                        "kind": "Deployment",
                        "name": "api",
                    },
                    "minReplicas": 4,
                    "maxReplicas": 10,
                },
            })
        );
    }

    #[test]
    fn patch_is_stable_for_same_bounds() {
        let target = TargetAutoscaler::from_hpa(&live_hpa(Some(2), 10)).unwrap();
        let desired = ReplicaBounds::new(4, 10);
        assert_eq!(target.bounds_patch(desired), target.bounds_patch(desired));
    }
}
