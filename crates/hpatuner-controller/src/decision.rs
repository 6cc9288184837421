//! Decision engine: computes desired HPA bounds from an observation.
//!
//! ```text
//! if error_rate <= threshold:
//!     desired = current                       (no change)
//! else:
//!     desired.max = ceiling
//!     desired.min = min(current.min + 2, ceiling)
//! ```
//!
//! Growth only: nothing here lowers bounds once the rate recovers. A
//! breach on an HPA already above the ceiling clamps both bounds down to
//! the ceiling.

use hpatuner_api::ReplicaBounds;

/// How much `minReplicas` grows per breaching pass.
pub const MIN_REPLICA_STEP: i32 = 2;

/// Output of [`decide`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub desired: ReplicaBounds,
    /// The observation exceeded the threshold.
    pub breached: bool,
    /// `desired` differs from the current bounds and must be applied.
    pub changed: bool,
}

/// Decide the desired bounds for a target HPA.
pub fn decide(current: ReplicaBounds, ceiling: i32, error_rate: f64, threshold: i64) -> Decision {
    if error_rate <= threshold as f64 {
        return Decision {
            desired: current,
            breached: false,
            changed: false,
        };
    }

    let desired = ReplicaBounds {
        min: current.min.saturating_add(MIN_REPLICA_STEP).min(ceiling),
        max: ceiling,
    };

    Decision {
        desired,
        breached: true,
        changed: desired != current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(min: i32, max: i32) -> ReplicaBounds {
        ReplicaBounds::new(min, max)
    }

    #[test]
    fn below_threshold_keeps_bounds() {
        let d = decide(bounds(2, 10), 10, 3.0, 5);
        assert_eq!(d.desired, bounds(2, 10));
        assert!(!d.breached);
        assert!(!d.changed);
    }

    #[test]
    fn equal_to_threshold_is_not_a_breach() {
        let d = decide(bounds(2, 10), 20, 5.0, 5);
        assert!(!d.breached);
        assert!(!d.changed);
    }

    #[test]
    fn breach_raises_min_by_two_and_max_to_ceiling() {
        let d = decide(bounds(2, 10), 10, 7.0, 5);
        assert_eq!(d.desired, bounds(4, 10));
        assert!(d.breached);
        assert!(d.changed);
    }

    #[test]
    fn breach_lifts_max_to_ceiling() {
        let d = decide(bounds(1, 4), 12, 5.01, 5);
        assert_eq!(d.desired, bounds(3, 12));
    }

    #[test]
    fn min_is_capped_at_ceiling() {
        let d = decide(bounds(9, 10), 10, 50.0, 5);
        assert_eq!(d.desired, bounds(10, 10));
    }

    #[test]
    fn breach_at_desired_bounds_is_unchanged() {
        let d = decide(bounds(10, 10), 10, 50.0, 5);
        assert!(d.breached);
        assert!(!d.changed);
        assert_eq!(d.desired, bounds(10, 10));
    }

    #[test]
    fn breach_above_ceiling_clamps_both_bounds() {
        let d = decide(bounds(12, 15), 10, 7.0, 5);
        assert_eq!(d.desired, bounds(10, 10));
        assert!(d.breached);
        assert!(d.changed);
    }

    #[test]
    fn quiet_above_ceiling_is_left_alone() {
        let d = decide(bounds(12, 15), 10, 3.0, 5);
        assert_eq!(d.desired, bounds(12, 15));
        assert!(!d.changed);
    }

    #[test]
    fn min_never_overflows() {
        let d = decide(bounds(i32::MAX, i32::MAX), i32::MAX, 1.0, 0);
        assert_eq!(d.desired, bounds(i32::MAX, i32::MAX));
    }

    #[test]
    fn breach_grid_respects_ceiling_and_ordering() {
        for ceiling in 1..=15 {
            for min in 0..=ceiling {
                for max in min..=ceiling {
                    let d = decide(bounds(min, max), ceiling, 6.5, 5);
                    assert_eq!(d.desired.max, ceiling);
                    assert_eq!(d.desired.min, (min + 2).min(ceiling));
                    assert!(d.desired.min <= d.desired.max);
                }
            }
        }
    }

    #[test]
    fn quiet_grid_never_changes() {
        for rate in [0.0, 1.5, 4.99, 5.0] {
            for min in 0..5 {
                let d = decide(bounds(min, 8), 10, rate, 5);
                assert_eq!(d.desired, bounds(min, 8));
                assert!(!d.changed);
            }
        }
    }

    #[test]
    fn is_deterministic() {
        let a = decide(bounds(3, 7), 9, 8.0, 5);
        let b = decide(bounds(3, 7), 9, 8.0, 5);
        assert_eq!(a, b);
    }
}
