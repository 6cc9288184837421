//! hpatuner-controller: reconciles `HpaTuner`s against their target HPAs.
//!
//! Observes an error rate for each tuner, widens the target HPA's replica
//! bounds when the rate breaches the threshold, and records what it saw
//! on the tuner's status.
//!
//! # Architecture
//!
//! ```text
//! runtime::run (kube-runtime Controller, one pass in flight per tuner)
//!   ├── Reconciler::reconcile(key)
//!   │   ├── ObjectStore   get tuner / get HPA / apply bounds / status
//!   │   ├── MetricSource  GET error rate
//!   │   ├── decide()      pure bound computation
//!   │   └── EventSink     lifecycle events
//!   └── RequeuePolicy    interval, immediate re-run on conflict,
//!                        per-tuner exponential backoff on errors
//! ```
//!
//! The reconciler only sees the `ObjectStore`, `MetricSource`, and
//! `EventSink` traits; `KubeStore`, `MetricFetcher`, and `KubeEventSink`
//! are the production implementations.

pub mod autoscaler;
pub mod config;
pub mod decision;
pub mod error;
pub mod events;
pub mod kube_store;
pub mod reconciler;
pub mod runtime;
pub mod schedule;
pub mod status;
pub mod store;
pub mod telemetry;

pub use autoscaler::{TargetAutoscaler, FIELD_MANAGER};
pub use config::ControllerConfig;
pub use decision::{decide, Decision};
pub use error::{ReconcileError, ReconcileResult, StoreError, StoreResult};
pub use events::{EventSink, LifecycleEvent, Severity};
pub use kube_store::{KubeEventSink, KubeStore};
pub use reconciler::{Outcome, Reconciler};
pub use schedule::{Requeue, RequeuePolicy};
pub use store::{MetricSource, ObjectStore};
pub use telemetry::{render_prometheus, ControllerMetrics, MetricsSnapshot};
