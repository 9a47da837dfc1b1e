//! The per-block performance view the titration and vigilance components
//! consume. Derived state only; the trial log remains the source of truth
//! and the window can be rebuilt from it at any time.

use cogbat_core::TrialRecord;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceWindow {
    outcomes: Vec<Option<bool>>,
    rts: Vec<Option<f64>>,
}

impl PerformanceWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the window for one block from persisted rows.
    pub fn from_records(records: &[TrialRecord], block: u32) -> Self {
        let mut window = Self::new();
        for record in records.iter().filter(|r| r.block == block) {
            window.push(record.correct, record.rt_s);
        }
        window
    }

    pub fn push(&mut self, correct: Option<bool>, rt_s: Option<f64>) {
        self.outcomes.push(correct);
        self.rts.push(rt_s);
    }

    pub fn reset(&mut self) {
        self.outcomes.clear();
        self.rts.clear();
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn outcomes(&self) -> &[Option<bool>] {
        &self.outcomes
    }

    pub fn rts(&self) -> &[Option<f64>] {
        &self.rts
    }

    /// Mean of the non-missing correctness values; None until at least one
    /// trial has a scorable outcome.
    pub fn mean_accuracy(&self) -> Option<f64> {
        let known: Vec<bool> = self.outcomes.iter().filter_map(|o| *o).collect();
        if known.is_empty() {
            None
        } else {
            Some(known.iter().filter(|c| **c).count() as f64 / known.len() as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(block: u32, trial: u32, correct: Option<bool>, rt_s: Option<f64>) -> TrialRecord {
        let mut r = TrialRecord::pending(1, block, trial, trial, "stroop", "congruent", "RED/red", 90);
        r.correct = correct;
        r.rt_s = rt_s;
        r
    }

    #[test]
    fn missing_outcomes_are_excluded_from_the_mean() {
        let mut window = PerformanceWindow::new();
        window.push(Some(true), Some(0.5));
        window.push(None, None);
        window.push(Some(false), Some(0.7));
        assert_eq!(window.mean_accuracy(), Some(0.5));
    }

    #[test]
    fn mean_is_undefined_with_no_scorable_trials() {
        let mut window = PerformanceWindow::new();
        assert_eq!(window.mean_accuracy(), None);
        window.push(None, None);
        assert_eq!(window.mean_accuracy(), None);
    }

    #[test]
    fn rebuild_from_records_is_idempotent() {
        let rows = vec![
            record(1, 1, Some(true), Some(0.4)),
            record(1, 2, None, None),
            record(2, 1, Some(false), Some(0.9)),
        ];
        let a = PerformanceWindow::from_records(&rows, 1);
        let b = PerformanceWindow::from_records(&rows, 1);
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.mean_accuracy(), b.mean_accuracy());
        // Only the requested block contributes.
        assert_eq!(PerformanceWindow::from_records(&rows, 2).len(), 1);
    }
}
