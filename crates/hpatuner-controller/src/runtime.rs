//! Controller runtime: drives the reconciler from the kube-runtime work
//! queue.
//!
//! The `Controller` watches `HpaTuner`s and guarantees a single in-flight
//! pass per object. Outcomes and errors are translated to requeue actions
//! through the [`RequeuePolicy`].

use std::sync::Arc;

use futures_util::StreamExt;
use kube::api::Api;
use kube::runtime::controller::{Action, Controller};
use kube::runtime::reflector::{ObjectRef, Store};
use kube::runtime::watcher;
use kube::Client;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use hpatuner_api::{HpaTuner, ObjectKey};
use hpatuner_metrics::MetricFetcher;

use crate::config::ControllerConfig;
use crate::error::ReconcileError;
use crate::kube_store::{KubeEventSink, KubeStore};
use crate::reconciler::Reconciler;
use crate::schedule::{Requeue, RequeuePolicy};
use crate::telemetry::ControllerMetrics;

/// Reconciler wired to the Kubernetes collaborators.
pub type KubeReconciler = Reconciler<KubeStore, MetricFetcher, KubeEventSink>;

/// Shared state handed to every reconcile invocation.
pub struct Context {
    reconciler: KubeReconciler,
    policy: RequeuePolicy,
    /// Tuners currently known to the controller's reflector.
    tuners: Store<HpaTuner>,
}

impl Context {
    pub fn new(
        client: Client,
        config: &ControllerConfig,
        telemetry: Arc<ControllerMetrics>,
        shutdown: watch::Receiver<bool>,
        tuners: Store<HpaTuner>,
    ) -> Self {
        let reconciler = Reconciler::new(
            KubeStore::new(client.clone(), config),
            MetricFetcher::new(config.metric_timeout),
            KubeEventSink::new(client, config),
            shutdown,
        )
        .with_telemetry(telemetry);

        Self {
            reconciler,
            policy: RequeuePolicy::new(
                config.requeue_interval,
                config.backoff_base,
                config.backoff_max,
            ),
            tuners,
        }
    }

    /// Forget backoff state for tuners the reflector no longer holds.
    fn prune_backoff(&self) {
        self.policy.retain(|key| {
            self.tuners
                .get(&ObjectRef::new(&key.name).within(&key.namespace))
                .is_some()
        });
    }
}

impl From<Requeue> for Action {
    fn from(requeue: Requeue) -> Self {
        match requeue {
            Requeue::Immediately => Action::requeue(std::time::Duration::ZERO),
            Requeue::After(delay) => Action::requeue(delay),
            Requeue::AwaitChange => Action::await_change(),
        }
    }
}

async fn reconcile_tuner(tuner: Arc<HpaTuner>, ctx: Arc<Context>) -> Result<Action, ReconcileError> {
    let key = ObjectKey::from_resource(tuner.as_ref());
    ctx.prune_backoff();
    let outcome = ctx.reconciler.reconcile(&key).await?;
    let requeue = ctx.policy.after_pass(&key, &outcome);
    debug!(tuner = %key, ?outcome, ?requeue, "pass finished");
    Ok(requeue.into())
}

fn error_policy(tuner: Arc<HpaTuner>, err: &ReconcileError, ctx: Arc<Context>) -> Action {
    let key = ObjectKey::from_resource(tuner.as_ref());
    let requeue = ctx.policy.after_error(&key, err);
    warn!(tuner = %key, error = %err, ?requeue, "reconciliation failed");
    requeue.into()
}

/// Run the controller until `shutdown` flips to `true`.
pub async fn run(
    client: Client,
    config: ControllerConfig,
    telemetry: Arc<ControllerMetrics>,
    shutdown: watch::Receiver<bool>,
) {
    let tuners: Api<HpaTuner> = match &config.namespace {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    };

    let controller = Controller::new(tuners, watcher::Config::default().any_semantic());
    let ctx = Arc::new(Context::new(
        client,
        &config,
        telemetry,
        shutdown.clone(),
        controller.store(),
    ));

    let mut stop = shutdown;
    let trigger = tokio::spawn(async move {
        let _ = stop.wait_for(|stop| *stop).await;
    });

    info!(
        namespace = config.namespace.as_deref().unwrap_or("<all>"),
        requeue_secs = config.requeue_interval.as_secs(),
        "hpatuner controller started"
    );

    controller
        .graceful_shutdown_on(async move {
            let _ = trigger.await;
        })
        .run(reconcile_tuner, error_policy, ctx)
        .for_each(|res| async move {
            match res {
                Ok((obj, _)) => debug!(tuner = %obj.name, "reconciled"),
                Err(e) => debug!(error = %e, "reconcile loop error"),
            }
        })
        .await;

    info!("hpatuner controller stopped");
}
