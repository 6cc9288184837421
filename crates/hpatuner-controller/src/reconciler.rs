//! Reconciler: one pass over one `HpaTuner`.
//!
//! Every pass starts from scratch and reads all state from the store:
//!
//! ```text
//! load tuner ──NotFound──▶ Deleted
//!     │
//! load target HPA ──NotFound──▶ Dormant
//!     │
//! fetch error rate ──Err──▶ surfaced (scheduler backs off)
//!     │
//! decide
//!     │ changed
//! apply bounds ──Conflict──▶ Conflict (re-run now)
//!     │        ──NotFound──▶ Dormant
//!     │        ──Err───────▶ surfaced
//! record status (best effort)
//!     │
//! Observed
//! ```
//!
//! Every await is raced against the shutdown signal; a pass interrupted
//! by shutdown ends with `ReconcileError::Cancelled` and mutates nothing
//! further.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info};

use hpatuner_api::{HpaTuner, ObjectKey, ReplicaBounds};

use crate::decision::decide;
use crate::error::{ReconcileError, ReconcileResult, StoreError};
use crate::events::{EventSink, LifecycleEvent};
use crate::status::{format_metric_value, record_status};
use crate::store::{MetricSource, ObjectStore};
use crate::telemetry::ControllerMetrics;

/// How a pass ended, when it did not surface an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The tuner no longer exists.
    Deleted,
    /// The target HPA does not exist (yet, or any more).
    Dormant,
    /// Applying bounds raced with another writer; the pass must re-run.
    Conflict,
    /// The pass completed and recorded an observation.
    Observed {
        /// Bounds recorded in status: applied ones, or the current ones.
        bounds: ReplicaBounds,
        error_rate: f64,
        /// New bounds were applied during this pass.
        applied: bool,
    },
}

/// Reconciles `HpaTuner`s through its collaborators.
pub struct Reconciler<S, M, E> {
    store: S,
    metrics: M,
    events: E,
    telemetry: Arc<ControllerMetrics>,
    shutdown: watch::Receiver<bool>,
}

impl<S, M, E> Reconciler<S, M, E>
where
    S: ObjectStore,
    M: MetricSource,
    E: EventSink,
{
    /// Create a reconciler. Passes are cancelled once `shutdown` flips to
    /// `true`.
    pub fn new(store: S, metrics: M, events: E, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            store,
            metrics,
            events,
            telemetry: Arc::new(ControllerMetrics::new()),
            shutdown,
        }
    }

    /// Share counters with the rest of the process.
    pub fn with_telemetry(mut self, telemetry: Arc<ControllerMetrics>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn telemetry(&self) -> &Arc<ControllerMetrics> {
        &self.telemetry
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one reconciliation pass for the tuner identified by `key`.
    pub async fn reconcile(&self, key: &ObjectKey) -> ReconcileResult<Outcome> {
        self.telemetry.record_reconciliation();
        let result = self.run_pass(key).await;
        if result.is_err() {
            self.telemetry.record_error();
        }
        result
    }

    async fn run_pass(&self, key: &ObjectKey) -> ReconcileResult<Outcome> {
        let mut shutdown = self.shutdown.clone();
        info!(tuner = %key, "reconciliation started");

        let tuner = match cancellable(&mut shutdown, self.store.get_tuner(key)).await? {
            Ok(tuner) => tuner,
            Err(StoreError::NotFound(_)) => {
                info!(tuner = %key, "tuner not found, likely deleted");
                return Ok(Outcome::Deleted);
            }
            Err(e) => {
                error!(tuner = %key, error = %e, "failed to fetch tuner");
                return Err(e.into());
            }
        };

        self.emit(&mut shutdown, &tuner, LifecycleEvent::Reconciling { tuner: key.clone() })
            .await?;

        let target_key = tuner.target_key();
        debug!(
            tuner = %key,
            hpa = %target_key,
            endpoint = %tuner.spec.metric_endpoint,
            "fetching target hpa"
        );

        let target = match cancellable(&mut shutdown, self.store.get_autoscaler(&target_key)).await? {
            Ok(target) => target,
            Err(StoreError::NotFound(_)) => {
                info!(tuner = %key, hpa = %target_key, "target hpa not found, tuner dormant");
                return Ok(Outcome::Dormant);
            }
            Err(e) => {
                error!(tuner = %key, hpa = %target_key, error = %e, "failed to fetch hpa");
                return Err(e.into());
            }
        };

        let error_rate = cancellable(
            &mut shutdown,
            self.metrics.fetch_error_rate(&tuner.spec.metric_endpoint),
        )
        .await?
        .map_err(|e| {
            error!(
                tuner = %key,
                endpoint = %tuner.spec.metric_endpoint,
                error = %e,
                "failed to fetch metric"
            );
            e
        })?;

        info!(
            tuner = %key,
            error_rate,
            threshold = tuner.spec.metric_threshold,
            "metric fetched"
        );

        let decision = decide(
            target.bounds,
            tuner.spec.max_ceiling_replicas,
            error_rate,
            tuner.spec.metric_threshold,
        );

        let mut observed = target.bounds;
        let mut applied = false;

        if decision.breached {
            self.telemetry.record_breach();
            info!(
                tuner = %key,
                hpa = %target_key,
                current_min = target.bounds.min,
                current_max = target.bounds.max,
                desired_min = decision.desired.min,
                desired_max = decision.desired.max,
                "threshold breached"
            );
            self.emit(
                &mut shutdown,
                &tuner,
                LifecycleEvent::ThresholdBreached {
                    target: target_key.clone(),
                    error_rate,
                    threshold: tuner.spec.metric_threshold,
                    current: target.bounds,
                    desired: decision.desired,
                },
            )
            .await?;
        } else {
            debug!(tuner = %key, "threshold not breached, no hpa changes needed");
        }

        if decision.changed {
            match cancellable(
                &mut shutdown,
                self.store.apply_bounds(&target, decision.desired),
            )
            .await?
            {
                Ok(()) => {
                    self.telemetry.record_applied();
                    info!(
                        tuner = %key,
                        hpa = %target_key,
                        min = decision.desired.min,
                        max = decision.desired.max,
                        "hpa updated"
                    );
                    self.emit(
                        &mut shutdown,
                        &tuner,
                        LifecycleEvent::HpaUpdated {
                            target: target_key.clone(),
                            from: target.bounds,
                            to: decision.desired,
                        },
                    )
                    .await?;
                    observed = decision.desired;
                    applied = true;
                }
                Err(StoreError::Conflict { message, .. }) => {
                    self.telemetry.record_conflict();
                    info!(tuner = %key, hpa = %target_key, %message, "conflict updating hpa, retrying");
                    return Ok(Outcome::Conflict);
                }
                Err(StoreError::NotFound(_)) => {
                    info!(tuner = %key, hpa = %target_key, "hpa disappeared during update");
                    return Ok(Outcome::Dormant);
                }
                Err(e) => {
                    error!(tuner = %key, hpa = %target_key, error = %e, "failed to apply hpa bounds");
                    self.emit(
                        &mut shutdown,
                        &tuner,
                        LifecycleEvent::UpdateFailed {
                            target: target_key.clone(),
                            desired: decision.desired,
                            error: e.to_string(),
                        },
                    )
                    .await?;
                    return Err(e.into());
                }
            }
        }

        let recorded = cancellable(
            &mut shutdown,
            record_status(&self.store, key, observed, error_rate),
        )
        .await?;
        if !recorded {
            self.telemetry.record_status_failure();
        }

        info!(
            tuner = %key,
            min = observed.min,
            max = observed.max,
            error_rate = %format_metric_value(error_rate),
            applied,
            "reconciliation completed"
        );
        self.emit(
            &mut shutdown,
            &tuner,
            LifecycleEvent::ReconciliationComplete {
                tuner: key.clone(),
                bounds: observed,
                error_rate,
            },
        )
        .await?;

        Ok(Outcome::Observed {
            bounds: observed,
            error_rate,
            applied,
        })
    }

    async fn emit(
        &self,
        shutdown: &mut watch::Receiver<bool>,
        tuner: &HpaTuner,
        event: LifecycleEvent,
    ) -> ReconcileResult<()> {
        debug!(reason = event.reason(), fields = ?event.fields(), "publishing event");
        cancellable(shutdown, self.events.publish(tuner, &event)).await
    }
}

/// Race `fut` against shutdown.
async fn cancellable<T>(
    shutdown: &mut watch::Receiver<bool>,
    fut: impl Future<Output = T>,
) -> ReconcileResult<T> {
    if *shutdown.borrow() {
        return Err(ReconcileError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = shutdown_signalled(shutdown) => Err(ReconcileError::Cancelled),
        out = fut => Ok(out),
    }
}

/// Resolves once shutdown is signalled. A dropped sender never signals.
async fn shutdown_signalled(shutdown: &mut watch::Receiver<bool>) {
    let closed = shutdown.wait_for(|stop| *stop).await.is_err();
    if closed {
        std::future::pending::<()>().await;
    }
}
