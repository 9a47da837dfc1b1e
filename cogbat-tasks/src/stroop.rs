//! Stroop color-naming: a color word drawn in an ink that matches the word
//! on half the trials. The participant answers with the INK.

use cogbat_core::{InkColor, ResponseKey, StimulusKind};
use cogbat_session::{Task, TitrationPolicy, TrialSetup};
use rand::{Rng, RngCore};

const KEYS: [ResponseKey; 4] = [
    ResponseKey::D,
    ResponseKey::F,
    ResponseKey::J,
    ResponseKey::K,
];

fn key_ink(key: ResponseKey) -> Option<InkColor> {
    match key {
        ResponseKey::D => Some(InkColor::Red),
        ResponseKey::F => Some(InkColor::Green),
        ResponseKey::J => Some(InkColor::Blue),
        ResponseKey::K => Some(InkColor::Yellow),
        _ => None,
    }
}

pub struct Stroop {
    last: Option<(&'static str, InkColor)>,
}

impl Stroop {
    pub fn new() -> Self {
        Self { last: None }
    }

    fn sample(&self, rng: &mut dyn RngCore) -> (&'static str, InkColor) {
        let word_color = InkColor::ALL[rng.random_range(0..InkColor::ALL.len())];
        let ink = if rng.random_bool(0.5) {
            word_color
        } else {
            // Any of the three non-matching inks.
            let others: Vec<InkColor> = InkColor::ALL
                .into_iter()
                .filter(|c| *c != word_color)
                .collect();
            others[rng.random_range(0..others.len())]
        };
        (word_color.word(), ink)
    }
}

impl Default for Stroop {
    fn default() -> Self {
        Self::new()
    }
}

impl Task for Stroop {
    fn name(&self) -> &'static str {
        "stroop"
    }

    fn instructions(&self) -> &'static str {
        "You will see color words printed in colored ink.\n\
         \n\
         Respond to the INK COLOR, not the word:\n\
         D = red   F = green   J = blue   K = yellow\n\
         \n\
         Answer as quickly and accurately as you can."
    }

    fn keys(&self) -> &'static [ResponseKey] {
        &KEYS
    }

    fn trials_per_block(&self) -> u32 {
        48
    }

    fn titration(&self) -> TitrationPolicy {
        TitrationPolicy {
            start: 90,
            floor: 30,
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
        let mut pair = self.sample(rng);
        // Re-roll once to dodge an exact repeat of word and ink.
        if self.last == Some(pair) {
            pair = self.sample(rng);
        }
        self.last = Some(pair);

        let (text, ink) = pair;
        let condition = if text == ink.word() {
            "congruent"
        } else {
            "incongruent"
        };
        TrialSetup {
            kind: StimulusKind::Word { text, ink },
            condition: condition.to_string(),
        }
    }

    fn grade(&self, setup: &TrialSetup, key: ResponseKey) -> Option<bool> {
        let StimulusKind::Word { ink, .. } = &setup.kind else {
            return Some(false);
        };
        Some(key_ink(key) == Some(*ink))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn grading_targets_the_ink_not_the_word() {
        let task = Stroop::new();
        let setup = TrialSetup {
            kind: StimulusKind::Word {
                text: "RED",
                ink: InkColor::Blue,
            },
            condition: "incongruent".into(),
        };
        assert_eq!(task.grade(&setup, ResponseKey::J), Some(true));
        assert_eq!(task.grade(&setup, ResponseKey::D), Some(false));
    }

    #[test]
    fn condition_matches_word_ink_agreement() {
        let mut task = Stroop::new();
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..200 {
            let setup = task.next_trial(&mut rng);
            let StimulusKind::Word { text, ink } = setup.kind else {
                panic!("stroop produced a non-word stimulus");
            };
            let expected = if text == ink.word() {
                "congruent"
            } else {
                "incongruent"
            };
            assert_eq!(setup.condition, expected);
        }
    }

    #[test]
    fn both_conditions_occur() {
        let mut task = Stroop::new();
        let mut rng = SmallRng::seed_from_u64(11);
        let mut congruent = 0;
        let mut incongruent = 0;
        for _ in 0..300 {
            match task.next_trial(&mut rng).condition.as_str() {
                "congruent" => congruent += 1,
                _ => incongruent += 1,
            }
        }
        assert!(congruent > 50);
        assert!(incongruent > 50);
    }
}
