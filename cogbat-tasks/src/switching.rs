//! Cued task-switching: judge a digit's parity or magnitude depending on the
//! cue shown above it. Cue repetitions and switches are labelled so switch
//! costs can be recovered from the log.

use cogbat_core::{ResponseKey, StimulusKind, SwitchCue};
use cogbat_session::{Task, TitrationPolicy, TrialSetup};
use rand::{Rng, RngCore};

const KEYS: [ResponseKey; 2] = [ResponseKey::Left, ResponseKey::Right];

pub struct TaskSwitching {
    last_cue: Option<SwitchCue>,
    last_digit: Option<u8>,
}

impl TaskSwitching {
    pub fn new() -> Self {
        Self {
            last_cue: None,
            last_digit: None,
        }
    }

    fn sample_digit(&self, rng: &mut dyn RngCore) -> u8 {
        // 1-9 without 5, which has no magnitude answer.
        loop {
            let d = rng.random_range(1..=9);
            if d != 5 && Some(d) != self.last_digit {
                return d;
            }
        }
    }
}

impl Default for TaskSwitching {
    fn default() -> Self {
        Self::new()
    }
}

impl Task for TaskSwitching {
    fn name(&self) -> &'static str {
        "switching"
    }

    fn instructions(&self) -> &'static str {
        "A cue above each digit tells you which judgment to make.\n\
         \n\
         ODD / EVEN:  LEFT = odd    RIGHT = even\n\
         LOW / HIGH:  LEFT = below five    RIGHT = above five\n\
         \n\
         The cue can change from trial to trial."
    }

    fn keys(&self) -> &'static [ResponseKey] {
        &KEYS
    }

    fn trials_per_block(&self) -> u32 {
        40
    }

    fn titration(&self) -> TitrationPolicy {
        TitrationPolicy {
            start: 120,
            floor: 36,
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
        let cue = if rng.random_bool(0.5) {
            SwitchCue::Parity
        } else {
            SwitchCue::Magnitude
        };
        let digit = self.sample_digit(rng);

        let condition = match self.last_cue {
            None => "start",
            Some(prev) if prev == cue => "repeat",
            Some(_) => "switch",
        };
        self.last_cue = Some(cue);
        self.last_digit = Some(digit);

        TrialSetup {
            kind: StimulusKind::CuedDigit { cue, digit },
            condition: condition.to_string(),
        }
    }

    fn grade(&self, setup: &TrialSetup, key: ResponseKey) -> Option<bool> {
        let StimulusKind::CuedDigit { cue, digit } = &setup.kind else {
            return Some(false);
        };
        let left_is_correct = match cue {
            SwitchCue::Parity => digit % 2 == 1,
            SwitchCue::Magnitude => *digit < 5,
        };
        Some(match key {
            ResponseKey::Left => left_is_correct,
            ResponseKey::Right => !left_is_correct,
            _ => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn setup(cue: SwitchCue, digit: u8) -> TrialSetup {
        TrialSetup {
            kind: StimulusKind::CuedDigit { cue, digit },
            condition: "repeat".into(),
        }
    }

    #[test]
    fn parity_judgment() {
        let task = TaskSwitching::new();
        assert_eq!(
            task.grade(&setup(SwitchCue::Parity, 7), ResponseKey::Left),
            Some(true)
        );
        assert_eq!(
            task.grade(&setup(SwitchCue::Parity, 4), ResponseKey::Right),
            Some(true)
        );
        assert_eq!(
            task.grade(&setup(SwitchCue::Parity, 4), ResponseKey::Left),
            Some(false)
        );
    }

    #[test]
    fn magnitude_judgment() {
        let task = TaskSwitching::new();
        assert_eq!(
            task.grade(&setup(SwitchCue::Magnitude, 2), ResponseKey::Left),
            Some(true)
        );
        assert_eq!(
            task.grade(&setup(SwitchCue::Magnitude, 8), ResponseKey::Right),
            Some(true)
        );
    }

    #[test]
    fn digits_never_repeat_and_never_hit_five() {
        let mut task = TaskSwitching::new();
        let mut rng = SmallRng::seed_from_u64(5);
        let mut prev = None;
        for _ in 0..200 {
            let s = task.next_trial(&mut rng);
            let StimulusKind::CuedDigit { digit, .. } = s.kind else {
                panic!("unexpected stimulus");
            };
            assert_ne!(digit, 5);
            assert_ne!(Some(digit), prev);
            prev = Some(digit);
        }
    }

    #[test]
    fn first_trial_is_start_then_repeat_or_switch() {
        let mut task = TaskSwitching::new();
        let mut rng = SmallRng::seed_from_u64(6);
        assert_eq!(task.next_trial(&mut rng).condition, "start");
        for _ in 0..50 {
            let c = task.next_trial(&mut rng).condition;
            assert!(c == "repeat" || c == "switch");
        }
    }
}
