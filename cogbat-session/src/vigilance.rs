//! Miss-streak watching: N consecutive no-response trials mean the
//! participant has likely disengaged, and the task should pause with a
//! reminder before any more trials are spent.

/// Pure check over the block's reaction-time history.
#[derive(Debug, Clone, Copy)]
pub struct MissStreakMonitor {
    threshold: usize,
}

impl MissStreakMonitor {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold: threshold.max(1),
        }
    }

    /// True iff the last `threshold` trials all lack a reaction time. With
    /// fewer than `threshold` trials on record the answer is false, stated
    /// outright rather than left to slicing semantics.
    pub fn should_interrupt(&self, rts: &[Option<f64>]) -> bool {
        if rts.len() < self.threshold {
            return false;
        }
        rts[rts.len() - self.threshold..]
            .iter()
            .all(|rt| rt.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_history_never_interrupts() {
        let monitor = MissStreakMonitor::new(3);
        assert!(!monitor.should_interrupt(&[]));
        assert!(!monitor.should_interrupt(&[None]));
        assert!(!monitor.should_interrupt(&[None, None]));
    }

    #[test]
    fn full_streak_interrupts() {
        let monitor = MissStreakMonitor::new(3);
        assert!(monitor.should_interrupt(&[None, None, None]));
        assert!(monitor.should_interrupt(&[Some(0.4), None, None, None]));
    }

    #[test]
    fn any_response_in_the_tail_resets() {
        let monitor = MissStreakMonitor::new(3);
        assert!(!monitor.should_interrupt(&[None, None, Some(0.6)]));
        assert!(!monitor.should_interrupt(&[None, Some(0.6), None]));
        // Older misses outside the tail don't count.
        assert!(!monitor.should_interrupt(&[None, None, None, Some(0.5), None]));
    }

    #[test]
    fn zero_threshold_is_clamped() {
        let monitor = MissStreakMonitor::new(0);
        assert!(!monitor.should_interrupt(&[]));
        assert!(monitor.should_interrupt(&[None]));
    }
}
