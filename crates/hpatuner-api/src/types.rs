//! Value types shared across the hpatuner crates.

use std::fmt;

use kube::{Resource, ResourceExt};
use serde::{Deserialize, Serialize};

/// Namespace-scoped identity of a Kubernetes object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Identity of a namespaced resource. Cluster-scoped objects get an
    /// empty namespace.
    pub fn from_resource<K: Resource>(obj: &K) -> Self {
        Self {
            namespace: obj.namespace().unwrap_or_default(),
            name: obj.name_any(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Min/max replica bounds of a HorizontalPodAutoscaler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaBounds {
    pub min: i32,
    pub max: i32,
}

impl ReplicaBounds {
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }
}

impl fmt::Display for ReplicaBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::autoscaling::v2::HorizontalPodAutoscaler;
    use kube::api::ObjectMeta;

    #[test]
    fn object_key_display() {
        let key = ObjectKey::new("prod", "api-hpa");
        assert_eq!(key.to_string(), "prod/api-hpa");
    }

    #[test]
    fn object_key_from_resource() {
        let hpa = HorizontalPodAutoscaler {
            metadata: ObjectMeta {
                name: Some("api".to_string()),
                namespace: Some("prod".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(ObjectKey::from_resource(&hpa), ObjectKey::new("prod", "api"));
    }

    #[test]
    fn object_key_without_namespace() {
        let hpa = HorizontalPodAutoscaler {
            metadata: ObjectMeta {
                name: Some("api".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(ObjectKey::from_resource(&hpa).namespace, "");
    }

    #[test]
    fn bounds_display() {
        assert_eq!(ReplicaBounds::new(2, 10).to_string(), "[2, 10]");
    }
}
