//! Controller counters and their Prometheus text exposition.

use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide reconciliation counters. Lock-free; shared via `Arc`.
#[derive(Debug, Default)]
pub struct ControllerMetrics {
    reconciliations: AtomicU64,
    reconcile_errors: AtomicU64,
    threshold_breaches: AtomicU64,
    bounds_applied: AtomicU64,
    conflicts: AtomicU64,
    status_write_failures: AtomicU64,
}

/// Point-in-time copy of [`ControllerMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub reconciliations: u64,
    pub reconcile_errors: u64,
    pub threshold_breaches: u64,
    pub bounds_applied: u64,
    pub conflicts: u64,
    pub status_write_failures: u64,
}

impl ControllerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_reconciliation(&self) {
        self.reconciliations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.reconcile_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_breach(&self) {
        self.threshold_breaches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_applied(&self) {
        self.bounds_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_conflict(&self) {
        self.conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_status_failure(&self) {
        self.status_write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            reconciliations: self.reconciliations.load(Ordering::Relaxed),
            reconcile_errors: self.reconcile_errors.load(Ordering::Relaxed),
            threshold_breaches: self.threshold_breaches.load(Ordering::Relaxed),
            bounds_applied: self.bounds_applied.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
            status_write_failures: self.status_write_failures.load(Ordering::Relaxed),
        }
    }
}

/// Render counters in the Prometheus text exposition format.
pub fn render_prometheus(snapshot: &MetricsSnapshot) -> String {
    let counters = [
        (
            "hpatuner_reconciliations_total",
            "Reconciliation passes started.",
            snapshot.reconciliations,
        ),
        (
            "hpatuner_reconcile_errors_total",
            "Reconciliation passes that surfaced an error.",
            snapshot.reconcile_errors,
        ),
        (
            "hpatuner_threshold_breaches_total",
            "Observations above the configured threshold.",
            snapshot.threshold_breaches,
        ),
        (
            "hpatuner_bounds_applied_total",
            "HPA bound changes applied.",
            snapshot.bounds_applied,
        ),
        (
            "hpatuner_apply_conflicts_total",
            "Apply attempts that hit a write conflict.",
            snapshot.conflicts,
        ),
        (
            "hpatuner_status_write_failures_total",
            "HpaTuner status updates that failed.",
            snapshot.status_write_failures,
        ),
    ];

    let mut out = String::new();
    for (name, help, value) in counters {
        out.push_str(&format!("# HELP {name} {help}\n"));
        out.push_str(&format!("# TYPE {name} counter\n"));
        out.push_str(&format!("{name} {value}\n"));
    }
    out
}
