//! Effort discounting: pick between a fixed easy offer and a variable
//! hard offer. A preference task with no correct answer, so it runs
//! unscored with a fixed response window.

use cogbat_core::{Offer, ResponseKey, StimulusKind};
use cogbat_session::{Task, TitrationPolicy, TrialSetup};
use rand::{Rng, RngCore};

const KEYS: [ResponseKey; 2] = [ResponseKey::Left, ResponseKey::Right];

const EASY: Offer = Offer {
    effort: 2,
    reward: 1,
};

pub struct EffortChoice {
    last_hard: Option<Offer>,
}

impl EffortChoice {
    pub fn new() -> Self {
        Self { last_hard: None }
    }
}

impl Default for EffortChoice {
    fn default() -> Self {
        Self::new()
    }
}

impl Task for EffortChoice {
    fn name(&self) -> &'static str {
        "effort"
    }

    fn instructions(&self) -> &'static str {
        "On each trial choose between two offers.\n\
         \n\
         LEFT  = the smaller offer with less button pressing\n\
         RIGHT = the bigger offer with more button pressing\n\
         \n\
         There is no right answer; choose what you actually prefer."
    }

    fn keys(&self) -> &'static [ResponseKey] {
        &KEYS
    }

    fn blocks(&self) -> u32 {
        1
    }

    fn trials_per_block(&self) -> u32 {
        20
    }

    fn titration(&self) -> TitrationPolicy {
        // Five seconds at the nominal refresh, held fixed.
        TitrationPolicy::fixed(300)
    }

    fn miss_streak_threshold(&self) -> usize {
        5
    }

    fn scored(&self) -> bool {
        false
    }

    fn next_trial(&mut self, rng: &mut dyn RngCore) -> TrialSetup {
        let hard = loop {
            let hard = Offer {
                effort: rng.random_range(6..=12),
                reward: rng.random_range(2..=6),
            };
            if Some(hard) != self.last_hard {
                break hard;
            }
        };
        self.last_hard = Some(hard);

        TrialSetup {
            kind: StimulusKind::OfferPair { easy: EASY, hard },
            condition: format!("hard_e{}r{}", hard.effort, hard.reward),
        }
    }

    fn grade(&self, _setup: &TrialSetup, _key: ResponseKey) -> Option<bool> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn choices_are_never_scored() {
        let mut task = EffortChoice::new();
        let mut rng = SmallRng::seed_from_u64(2);
        let setup = task.next_trial(&mut rng);
        assert_eq!(task.grade(&setup, ResponseKey::Left), None);
        assert_eq!(task.grade(&setup, ResponseKey::Right), None);
        assert!(!task.scored());
    }

    #[test]
    fn hard_offer_always_dominates_on_both_axes() {
        let mut task = EffortChoice::new();
        let mut rng = SmallRng::seed_from_u64(9);
        let mut prev = None;
        for _ in 0..100 {
            let setup = task.next_trial(&mut rng);
            let StimulusKind::OfferPair { easy, hard } = setup.kind else {
                panic!("unexpected stimulus");
            };
            assert_eq!(easy, EASY);
            assert!(hard.effort > easy.effort);
            assert!(hard.reward > easy.reward);
            assert_ne!(Some(hard), prev);
            prev = Some(hard);
        }
    }

    #[test]
    fn deadline_policy_is_pinned() {
        let task = EffortChoice::new();
        let p = task.titration();
        assert_eq!(p.start, 300);
        assert_eq!(p.floor, 300);
        assert_eq!((p.tighten, p.relax, p.rescue), (0, 0, 0));
    }
}
