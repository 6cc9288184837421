//! Requeue policy: maps pass outcomes and errors to the next invocation.
//!
//! Successful passes poll again after the fixed interval. Surfaced errors
//! back off exponentially per tuner (base → max, doubling), and the
//! counter resets on the next success. Write conflicts re-run immediately
//! and never touch the backoff.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tracing::debug;

use hpatuner_api::ObjectKey;

use crate::error::ReconcileError;
use crate::reconciler::Outcome;

/// When the scheduler should invoke the reconciler again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requeue {
    /// Run again right away.
    Immediately,
    /// Run again after the given delay.
    After(Duration),
    /// Only run again on a watch event.
    AwaitChange,
}

/// Per-tuner requeue and backoff bookkeeping.
#[derive(Debug)]
pub struct RequeuePolicy {
    interval: Duration,
    backoff_base: Duration,
    backoff_max: Duration,
    /// Consecutive surfaced failures per tuner.
    failures: Mutex<HashMap<ObjectKey, u32>>,
}

impl RequeuePolicy {
    pub fn new(interval: Duration, backoff_base: Duration, backoff_max: Duration) -> Self {
        Self {
            interval,
            backoff_base,
            backoff_max,
            failures: Mutex::new(HashMap::new()),
        }
    }

    /// Next invocation after a pass that returned an outcome.
    pub fn after_pass(&self, key: &ObjectKey, outcome: &Outcome) -> Requeue {
        match outcome {
            Outcome::Conflict => Requeue::Immediately,
            Outcome::Deleted => {
                self.forget(key);
                Requeue::AwaitChange
            }
            Outcome::Dormant | Outcome::Observed { .. } => {
                self.forget(key);
                Requeue::After(self.interval)
            }
        }
    }

    /// Next invocation after a pass that surfaced an error.
    pub fn after_error(&self, key: &ObjectKey, err: &ReconcileError) -> Requeue {
        if matches!(err, ReconcileError::Cancelled) {
            return Requeue::AwaitChange;
        }

        let mut failures = self.failures.lock().unwrap_or_else(|e| e.into_inner());
        let count = failures.entry(key.clone()).or_insert(0);
        *count = count.saturating_add(1);
        let delay = self.delay_for(*count);
        debug!(tuner = %key, failures = *count, delay_secs = delay.as_secs(), "backing off");
        Requeue::After(delay)
    }

    /// Consecutive surfaced failures recorded for `key`.
    pub fn failures(&self, key: &ObjectKey) -> u32 {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .copied()
            .unwrap_or(0)
    }

    /// Drop backoff state for tuners for which `live` returns false.
    ///
    /// A tuner deleted while backing off is never reconciled again, so its
    /// entry would otherwise stay forever.
    pub fn retain(&self, live: impl Fn(&ObjectKey) -> bool) {
        let mut failures = self.failures.lock().unwrap_or_else(|e| e.into_inner());
        failures.retain(|key, _| {
            let keep = live(key);
            if !keep {
                debug!(tuner = %key, "dropping backoff for vanished tuner");
            }
            keep
        });
    }

    fn forget(&self, key: &ObjectKey) {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
    }

    /// base * 2^(failures - 1), capped at max.
    fn delay_for(&self, failures: u32) -> Duration {
        let exp = failures.saturating_sub(1).min(16);
        self.backoff_base
            .saturating_mul(1u32 << exp)
            .min(self.backoff_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hpatuner_api::ReplicaBounds;
    use hpatuner_metrics::MetricFetchError;

    fn policy() -> RequeuePolicy {
        RequeuePolicy::new(
            Duration::from_secs(30),
            Duration::from_secs(1),
            Duration::from_secs(60),
        )
    }

    fn transient() -> ReconcileError {
        ReconcileError::Metric(MetricFetchError::Status(503))
    }

    fn observed() -> Outcome {
        Outcome::Observed {
            bounds: ReplicaBounds::new(2, 10),
            error_rate: 1.0,
            applied: false,
        }
    }

    #[test]
    fn success_polls_after_interval() {
        let key = ObjectKey::new("prod", "tuner");
        assert_eq!(
            policy().after_pass(&key, &observed()),
            Requeue::After(Duration::from_secs(30))
        );
    }

    #[test]
    fn dormant_polls_after_interval() {
        let key = ObjectKey::new("prod", "tuner");
        assert_eq!(
            policy().after_pass(&key, &Outcome::Dormant),
            Requeue::After(Duration::from_secs(30))
        );
    }

    #[test]
    fn deleted_waits_for_change() {
        let key = ObjectKey::new("prod", "tuner");
        assert_eq!(policy().after_pass(&key, &Outcome::Deleted), Requeue::AwaitChange);
    }

    #[test]
    fn conflict_requeues_immediately_without_backoff() {
        let policy = policy();
        let key = ObjectKey::new("prod", "tuner");
        assert_eq!(policy.after_pass(&key, &Outcome::Conflict), Requeue::Immediately);
        assert_eq!(policy.failures(&key), 0);
    }

    #[test]
    fn conflict_leaves_existing_backoff_untouched() {
        let policy = policy();
        let key = ObjectKey::new("prod", "tuner");
        policy.after_error(&key, &transient());
        policy.after_pass(&key, &Outcome::Conflict);
        assert_eq!(policy.failures(&key), 1);
    }

    #[test]
    fn errors_back_off_exponentially() {
        let policy = policy();
        let key = ObjectKey::new("prod", "tuner");
        let delays: Vec<_> = (0..4).map(|_| policy.after_error(&key, &transient())).collect();
        assert_eq!(
            delays,
            vec![
                Requeue::After(Duration::from_secs(1)),
                Requeue::After(Duration::from_secs(2)),
                Requeue::After(Duration::from_secs(4)),
                Requeue::After(Duration::from_secs(8)),
            ]
        );
    }

    #[test]
    fn backoff_caps_at_max() {
        let policy = policy();
        let key = ObjectKey::new("prod", "tuner");
        let mut last = Requeue::Immediately;
        for _ in 0..40 {
            last = policy.after_error(&key, &transient());
        }
        assert_eq!(last, Requeue::After(Duration::from_secs(60)));
    }

    #[test]
    fn backoff_resets_on_success() {
        let policy = policy();
        let key = ObjectKey::new("prod", "tuner");
        policy.after_error(&key, &transient());
        policy.after_error(&key, &transient());
        policy.after_pass(&key, &observed());
        assert_eq!(policy.failures(&key), 0);
        assert_eq!(
            policy.after_error(&key, &transient()),
            Requeue::After(Duration::from_secs(1))
        );
    }

    #[test]
    fn backoff_is_per_tuner() {
        let policy = policy();
        let a = ObjectKey::new("prod", "a");
        let b = ObjectKey::new("prod", "b");
        policy.after_error(&a, &transient());
        policy.after_error(&a, &transient());
        assert_eq!(policy.failures(&a), 2);
        assert_eq!(policy.failures(&b), 0);
    }

    #[test]
    fn retain_drops_vanished_tuners() {
        let policy = policy();
        let live = ObjectKey::new("prod", "live");
        let gone = ObjectKey::new("prod", "gone");
        policy.after_error(&live, &transient());
        policy.after_error(&gone, &transient());
        policy.after_error(&gone, &transient());

        policy.retain(|key| key == &live);

        assert_eq!(policy.failures(&live), 1);
        assert_eq!(policy.failures(&gone), 0);
        assert_eq!(
            policy.after_error(&gone, &transient()),
            Requeue::After(Duration::from_secs(1))
        );
    }

    #[test]
    fn cancellation_is_not_retried() {
        let policy = policy();
        let key = ObjectKey::new("prod", "tuner");
        assert_eq!(
            policy.after_error(&key, &ReconcileError::Cancelled),
            Requeue::AwaitChange
        );
        assert_eq!(policy.failures(&key), 0);
    }
}
