//! hpatuner-api: API types for the hpatuner controller.
//!
//! Defines the `HpaTuner` custom resource (`mycrds.akmusa.com/v1alpha1`)
//! and the small value types shared by the controller and the daemon.
//!
//! # Resource shape
//!
//! ```text
//! HpaTuner
//!   ├── spec   (owned by users)
//!   │   ├── hpaName / hpaNamespace   → target HorizontalPodAutoscaler
//!   │   ├── metricEndpoint           → http:// error-rate endpoint
//!   │   ├── metricThreshold          → breach threshold
//!   │   └── hpaMaxReplicas           → ceiling for maxReplicas
//!   └── status (owned by the controller)
//!       ├── lastObservedMin / lastObservedMax
//!       ├── lastMetricValue          → "7.00"
//!       └── lastUpdateTime           → RFC 3339
//! ```

pub mod tuner;
pub mod types;

pub use tuner::{HpaTuner, HpaTunerSpec, HpaTunerStatus, API_GROUP, API_VERSION};
pub use types::{ObjectKey, ReplicaBounds};
