//! Adaptive response-deadline titration.
//!
//! After every trial the tracker looks at the block's correctness history and
//! nudges the next trial's deadline: tighten while the participant is both
//! fast-enough and accurate, relax when accuracy drops. Step sizes differ per
//! task, so they are policy data rather than constants.

/// Per-task titration parameters. All steps are in frame units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TitrationPolicy {
    /// Deadline for the first trial of a block.
    pub start: u32,
    /// Hard lower bound; the deadline never goes below this (and never 0).
    pub floor: u32,
    /// Subtracted after a correct trial when block accuracy is at the pivot.
    pub tighten: u32,
    /// Small increase after a correct trial under the pivot, and the
    /// fallback step when accuracy is still undefined.
    pub relax: u32,
    /// Large increase after an error or miss under the pivot.
    pub rescue: u32,
    /// Block accuracy at or above which performance counts as "good".
    pub accuracy_pivot: f64,
}

impl TitrationPolicy {
    /// A policy whose deadline never moves, for unscored tasks.
    pub fn fixed(deadline: u32) -> Self {
        Self {
            start: deadline,
            floor: deadline.max(1),
            tighten: 0,
            relax: 0,
            rescue: 0,
            accuracy_pivot: 0.8,
        }
    }
}

/// Deadline for the next trial, from the block's correctness history so far.
///
/// `outcomes` is ordered, one entry per attempted trial in the block; `None`
/// marks a trial without a scorable response. Missing values are excluded
/// from the accuracy mean (not scored as failures), but a missing latest
/// trial takes the incorrect branch.
pub fn next_deadline(policy: &TitrationPolicy, current: u32, outcomes: &[Option<bool>]) -> u32 {
    let last = outcomes.last().copied().flatten();
    let known: Vec<bool> = outcomes.iter().filter_map(|o| *o).collect();
    let mean_acc = if known.is_empty() {
        None
    } else {
        Some(known.iter().filter(|c| **c).count() as f64 / known.len() as f64)
    };

    let next = match (last, mean_acc) {
        // Accurate overall and got this one: push the window down.
        (Some(true), Some(m)) if m >= policy.accuracy_pivot => {
            current.saturating_sub(policy.tighten)
        }
        (Some(true), Some(_)) => current.saturating_add(policy.relax),
        // Missed or wrong while overall accuracy holds up: leave it alone.
        (Some(false) | None, Some(m)) if m >= policy.accuracy_pivot => current,
        (Some(false) | None, Some(_)) => current.saturating_add(policy.rescue),
        // No usable history yet.
        (_, None) => current.saturating_add(policy.relax),
    };

    next.max(policy.floor).max(1)
}

/// Stateful wrapper holding the deadline currently in force.
#[derive(Debug, Clone)]
pub struct DeadlineTracker {
    policy: TitrationPolicy,
    deadline: u32,
}

impl DeadlineTracker {
    pub fn new(policy: TitrationPolicy) -> Self {
        let deadline = policy.start.max(policy.floor).max(1);
        Self { policy, deadline }
    }

    /// Deadline to use for the upcoming trial.
    pub fn current(&self) -> u32 {
        self.deadline
    }

    /// Fold in the block history (latest trial last) and return the deadline
    /// for the next trial.
    pub fn observe(&mut self, outcomes: &[Option<bool>]) -> u32 {
        self.deadline = next_deadline(&self.policy, self.deadline, outcomes);
        self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn policy(start: u32, tighten: u32, relax: u32, rescue: u32) -> TitrationPolicy {
        TitrationPolicy {
            start,
            floor: 1,
            tighten,
            relax,
            rescue,
            accuracy_pivot: 0.8,
        }
    }

    #[test]
    fn hand_traced_block_matches_policy() {
        // correctness [T, T, F, T, T], start 120, steps (-3, +1, +0, +6)
        let mut tracker = DeadlineTracker::new(policy(120, 3, 1, 6));
        let outcomes = [true, true, false, true, true];
        let mut history: Vec<Option<bool>> = Vec::new();
        let mut produced = Vec::new();
        for o in outcomes {
            history.push(Some(o));
            produced.push(tracker.observe(&history));
        }
        assert_eq!(produced, vec![117, 114, 120, 121, 118]);
    }

    #[test]
    fn no_history_falls_back_to_relax() {
        let p = policy(100, 3, 1, 6);
        assert_eq!(next_deadline(&p, 100, &[]), 101);
    }

    #[test]
    fn all_missing_history_is_undefined_accuracy() {
        let p = policy(100, 3, 1, 6);
        // Mean excludes missing values, so it stays undefined and the
        // fallback (small) step applies even though the last trial missed.
        assert_eq!(next_deadline(&p, 100, &[None, None, None]), 101);
    }

    #[test]
    fn miss_with_good_accuracy_leaves_deadline_unchanged() {
        let p = policy(100, 3, 1, 6);
        let history = [Some(true), Some(true), Some(true), Some(true), None];
        assert_eq!(next_deadline(&p, 90, &history), 90);
    }

    #[test]
    fn error_under_pivot_takes_the_rescue_step() {
        let p = policy(100, 3, 1, 6);
        let history = [Some(true), Some(false), Some(false)];
        assert_eq!(next_deadline(&p, 90, &history), 96);
    }

    #[test]
    fn floor_is_enforced() {
        let p = TitrationPolicy {
            start: 10,
            floor: 8,
            tighten: 5,
            relax: 1,
            rescue: 6,
            accuracy_pivot: 0.8,
        };
        assert_eq!(next_deadline(&p, 10, &[Some(true)]), 8);
        assert_eq!(next_deadline(&p, 8, &[Some(true), Some(true)]), 8);
    }

    #[test]
    fn fixed_policy_never_moves() {
        let mut tracker = DeadlineTracker::new(TitrationPolicy::fixed(300));
        for i in 0..20 {
            let history: Vec<Option<bool>> = (0..=i).map(|_| None).collect();
            assert_eq!(tracker.observe(&history), 300);
        }
    }

    proptest! {
        #[test]
        fn deadline_stays_positive_and_above_floor(
            start in 1u32..600,
            floor in 1u32..120,
            tighten in 0u32..20,
            relax in 0u32..20,
            rescue in 0u32..40,
            outcomes in proptest::collection::vec(
                proptest::option::of(any::<bool>()), 0..200),
        ) {
            let p = TitrationPolicy {
                start, floor, tighten, relax, rescue, accuracy_pivot: 0.8,
            };
            let mut tracker = DeadlineTracker::new(p);
            let mut history = Vec::new();
            for o in outcomes {
                history.push(o);
                let d = tracker.observe(&history);
                prop_assert!(d >= 1);
                prop_assert!(d >= floor);
            }
        }
    }
}
