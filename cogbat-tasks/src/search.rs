//! Visual search: find the T among rotated Ls. Set size varies so search
//! slopes can be estimated; the seed pins the jittered layout per trial.

use cogbat_core::{ResponseKey, Stimulus, StimulusKind};
use cogbat_session::{Task, TitrationPolicy, TrialSetup};
use rand::{Rng, RngCore};

/// J = target present, F = target absent.
const KEYS: [ResponseKey; 2] = [ResponseKey::F, ResponseKey::J];

const SET_SIZES: [u8; 3] = [8, 16, 24];

pub struct VisualSearch {
    last: Option<(bool, u8)>,
}

impl VisualSearch {
    pub fn new() -> Self {
        Self { last: None }
    }
}

impl Default for VisualSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl Task for VisualSearch {
    fn name(&self) -> &'static str {
        "search"
    }

    fn instructions(&self) -> &'static str {
        "Each display contains rotated L shapes. On some trials one of the\n\
         items is a T.\n\
         \n\
         J = a T is PRESENT    F = no T, only Ls\n\
         \n\
         Some displays are crowded; scan them carefully but keep moving."
    }

    fn keys(&self) -> &'static [ResponseKey] {
        &KEYS
    }

    fn trials_per_block(&self) -> u32 {
        36
    }

    fn titration(&self) -> TitrationPolicy {
        TitrationPolicy {
            start: 300,
            floor: 90,
            tighten: 6,
            relax: 2,
            rescue: 12,
            accuracy_pivot: 0.8,
        }
    }

    fn miss_streak_threshold(&self) -> usize {
        4
    }

    fn next_trial(&mut self, rng: &mut dyn RngCore) -> TrialSetup {
        let mut pick = (
            rng.random_bool(0.5),
            SET_SIZES[rng.random_range(0..SET_SIZES.len())],
        );
        if self.last == Some(pick) {
            pick = (
                rng.random_bool(0.5),
                SET_SIZES[rng.random_range(0..SET_SIZES.len())],
            );
        }
        self.last = Some(pick);
        let (target_present, set_size) = pick;

        let kind = StimulusKind::SearchArray {
            target_present,
            set_size,
            seed: rng.next_u64(),
        };
        let condition = kind.label();
        TrialSetup { kind, condition }
    }

    fn grade(&self, setup: &TrialSetup, key: ResponseKey) -> Option<bool> {
        let StimulusKind::SearchArray { target_present, .. } = &setup.kind else {
            return Some(false);
        };
        Some(match key {
            ResponseKey::J => *target_present,
            ResponseKey::F => !*target_present,
            _ => false,
        })
    }
}
