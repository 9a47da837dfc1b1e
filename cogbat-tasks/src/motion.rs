//! Dot-motion discrimination: a field of dots, a fraction of which drift
//! coherently left or right. The per-trial seed pins the layout so the
//! renderer animates the same field on every frame of the trial.

use cogbat_core::{Heading, ResponseKey, Stimulus, StimulusKind};
use cogbat_session::{Task, TitrationPolicy, TrialSetup};
use rand::{Rng, RngCore};

const KEYS: [ResponseKey; 2] = [ResponseKey::Left, ResponseKey::Right];

pub struct DotMotion {
    coherence: f32,
}

impl DotMotion {
    pub fn new() -> Self {
        Self { coherence: 0.25 }
    }

    pub fn with_coherence(coherence: f32) -> Self {
        Self {
            coherence: coherence.clamp(0.05, 1.0),
        }
    }
}

impl Default for DotMotion {
    fn default() -> Self {
        Self::new()
    }
}

impl Task for DotMotion {
    fn name(&self) -> &'static str {
        "motion"
    }

    fn instructions(&self) -> &'static str {
        "A cloud of moving dots will appear. Some of the dots drift\n\
         together in one direction.\n\
         \n\
         LEFT ARROW = drifting left    RIGHT ARROW = drifting right"
    }

    fn keys(&self) -> &'static [ResponseKey] {
        &KEYS
    }

    fn trials_per_block(&self) -> u32 {
        32
    }

    fn titration(&self) -> TitrationPolicy {
        TitrationPolicy {
            start: 180,
            floor: 60,
            tighten: 3,
            relax: 1,
            rescue: 6,
            accuracy_pivot: 0.8,
        }
    }

    fn miss_streak_threshold(&self) -> usize {
        3
    }

    fn next_trial(&mut self, rng: &mut dyn RngCore) -> TrialSetup {
        let heading = if rng.random_bool(0.5) {
            Heading::Left
        } else {
            Heading::Right
        };
        let kind = StimulusKind::DotField {
            coherence: self.coherence,
            heading,
            seed: rng.next_u64(),
        };
        let condition = kind.label();
        TrialSetup { kind, condition }
    }

    fn grade(&self, setup: &TrialSetup, key: ResponseKey) -> Option<bool> {
        let StimulusKind::DotField { heading, .. } = &setup.kind else {
            return Some(false);
        };
        Some(match key {
            ResponseKey::Left => *heading == Heading::Left,
            ResponseKey::Right => *heading == Heading::Right,
            _ => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn grading_matches_the_heading() {
        let task = DotMotion::new();
        let setup = TrialSetup {
            kind: StimulusKind::DotField {
                coherence: 0.25,
                heading: Heading::Left,
                seed: 1,
            },
            condition: "coh25:left".into(),
        };
        assert_eq!(task.grade(&setup, ResponseKey::Left), Some(true));
        assert_eq!(task.grade(&setup, ResponseKey::Right), Some(false));
    }

    #[test]
    fn seeds_differ_across_trials() {
        let mut task = DotMotion::new();
        let mut rng = SmallRng::seed_from_u64(21);
        let mut seeds = std::collections::HashSet::new();
        for _ in 0..50 {
            let StimulusKind::DotField { seed, .. } = task.next_trial(&mut rng).kind else {
                panic!("unexpected stimulus");
            };
            seeds.insert(seed);
        }
        assert_eq!(seeds.len(), 50);
    }

    #[test]
    fn coherence_is_clamped() {
        assert_eq!(DotMotion::with_coherence(0.0).coherence, 0.05);
        assert_eq!(DotMotion::with_coherence(2.0).coherence, 1.0);
    }
}
