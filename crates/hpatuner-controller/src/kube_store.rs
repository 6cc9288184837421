//! Kubernetes-backed collaborators: the object store over `kube::Api` and
//! the event sink over the kube-runtime `Recorder`.

use k8s_openapi::api::autoscaling::v2::HorizontalPodAutoscaler;
use kube::api::{Api, Patch, PatchParams};
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use kube::{Client, Resource};
use serde_json::json;
use tracing::{debug, warn};

use hpatuner_api::{HpaTuner, HpaTunerStatus, ObjectKey, ReplicaBounds};

use crate::autoscaler::TargetAutoscaler;
use crate::config::ControllerConfig;
use crate::error::{StoreError, StoreResult};
use crate::events::{EventSink, LifecycleEvent, Severity};
use crate::store::ObjectStore;

/// Object store backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
    field_manager: String,
}

impl KubeStore {
    pub fn new(client: Client, config: &ControllerConfig) -> Self {
        Self {
            client,
            field_manager: config.field_manager.clone(),
        }
    }

    fn tuners(&self, namespace: &str) -> Api<HpaTuner> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn autoscalers(&self, namespace: &str) -> Api<HorizontalPodAutoscaler> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

impl ObjectStore for KubeStore {
    async fn get_tuner(&self, key: &ObjectKey) -> StoreResult<HpaTuner> {
        self.tuners(&key.namespace)
            .get(&key.name)
            .await
            .map_err(|e| StoreError::from_kube(e, key))
    }

    async fn update_tuner_status(&self, key: &ObjectKey, status: &HpaTunerStatus) -> StoreResult<()> {
        let patch = json!({ "status": status });
        self.tuners(&key.namespace)
            .patch_status(&key.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(|e| StoreError::from_kube(e, key))?;
        Ok(())
    }

    async fn get_autoscaler(&self, key: &ObjectKey) -> StoreResult<TargetAutoscaler> {
        let hpa = self
            .autoscalers(&key.namespace)
            .get(&key.name)
            .await
            .map_err(|e| StoreError::from_kube(e, key))?;
        TargetAutoscaler::from_hpa(&hpa)
    }

    async fn apply_bounds(&self, target: &TargetAutoscaler, desired: ReplicaBounds) -> StoreResult<()> {
        let patch = target.bounds_patch(desired);
        let params = PatchParams::apply(&self.field_manager).force();
        self.autoscalers(&target.key.namespace)
            .patch(&target.key.name, &params, &Patch::Apply(&patch))
            .await
            .map_err(|e| StoreError::from_kube(e, &target.key))?;
        debug!(hpa = %target.key, %desired, manager = %self.field_manager, "bounds applied");
        Ok(())
    }
}

/// Event sink publishing Kubernetes `Event`s against the tuner.
#[derive(Clone)]
pub struct KubeEventSink {
    recorder: Recorder,
}

impl KubeEventSink {
    pub fn new(client: Client, config: &ControllerConfig) -> Self {
        let reporter = Reporter {
            controller: config.reporter.clone(),
            instance: config.instance.clone(),
        };
        Self {
            recorder: Recorder::new(client, reporter),
        }
    }
}

impl EventSink for KubeEventSink {
    async fn publish(&self, tuner: &HpaTuner, event: &LifecycleEvent) {
        let ev = Event {
            type_: match event.severity() {
                Severity::Normal => EventType::Normal,
                Severity::Warning => EventType::Warning,
            },
            reason: event.reason().to_string(),
            note: Some(event.note()),
            action: event.action().to_string(),
            secondary: None,
        };
        let reference = tuner.object_ref(&());
        if let Err(e) = self.recorder.publish(&ev, &reference).await {
            warn!(
                tuner = %ObjectKey::from_resource(tuner),
                reason = event.reason(),
                error = %e,
                "failed to publish event"
            );
        }
    }
}
