//! The per-task strategy seam. Each battery task supplies stimulus
//! generation, its key set and correctness rule, and the titration and
//! vigilance parameters; one generic runner does everything else.

use cogbat_core::{ResponseKey, StimulusKind};
use rand::RngCore;

use crate::titration::TitrationPolicy;

/// One generated trial: what to show and how to label it in the log.
#[derive(Debug, Clone)]
pub struct TrialSetup {
    pub kind: StimulusKind,
    pub condition: String,
}

pub trait Task {
    /// Short machine name; also the log filename prefix.
    fn name(&self) -> &'static str;

    /// Instruction text shown before the task's first block. Blank lines
    /// separate paragraphs.
    fn instructions(&self) -> &'static str;

    /// Keys this task accepts as responses; anything else is ignored.
    fn keys(&self) -> &'static [ResponseKey];

    fn blocks(&self) -> u32 {
        2
    }

    fn trials_per_block(&self) -> u32;

    fn titration(&self) -> TitrationPolicy;

    /// Consecutive misses before the runner raises a reminder.
    fn miss_streak_threshold(&self) -> usize;

    /// False for preference tasks with no right answer.
    fn scored(&self) -> bool {
        true
    }

    /// Generate the next trial. Implementations avoid exact repeats of the
    /// previous stimulus where the stimulus space allows it.
    fn next_trial(&mut self, rng: &mut dyn RngCore) -> TrialSetup;

    /// Correctness of `key` for `setup`; None for unscored tasks.
    fn grade(&self, setup: &TrialSetup, key: ResponseKey) -> Option<bool>;
}
