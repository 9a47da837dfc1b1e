//! Mental-math updating: a two-operator running sum with a claimed result to
//! verify. Lures sit within two of the true value so the sum actually has to
//! be carried, not estimated.

use cogbat_core::{ResponseKey, StimulusKind};
use cogbat_session::{Task, TitrationPolicy, TrialSetup};
use rand::{Rng, RngCore};

/// F = the claim is false, J = the claim is true.
const KEYS: [ResponseKey; 2] = [ResponseKey::F, ResponseKey::J];

pub struct MentalMath {
    last_text: Option<String>,
}

impl MentalMath {
    pub fn new() -> Self {
        Self { last_text: None }
    }

    /// A chain `a ± b ± c` whose running value never dips below zero.
    fn sample_chain(rng: &mut dyn RngCore) -> (String, i32) {
        loop {
            let a = rng.random_range(2..=9);
            let b = rng.random_range(1..=9);
            let c = rng.random_range(1..=9);
            let add_b = rng.random_bool(0.5);
            let add_c = rng.random_bool(0.5);

            let mid = if add_b { a + b } else { a - b };
            if mid < 0 {
                continue;
            }
            let total = if add_c { mid + c } else { mid - c };
            if total < 0 {
                continue;
            }

            let text = format!(
                "{} {} {} {} {}",
                a,
                if add_b { "+" } else { "\u{2212}" },
                b,
                if add_c { "+" } else { "\u{2212}" },
                c
            );
            return (text, total);
        }
    }
}

impl Default for MentalMath {
    fn default() -> Self {
        Self::new()
    }
}

impl Task for MentalMath {
    fn name(&self) -> &'static str {
        "arithmetic"
    }

    fn instructions(&self) -> &'static str {
        "Work through each sum from left to right and check the answer\n\
         shown after the equals sign.\n\
         \n\
         J = the answer is CORRECT    F = the answer is WRONG"
    }

    fn keys(&self) -> &'static [ResponseKey] {
        &KEYS
    }

    fn trials_per_block(&self) -> u32 {
        24
    }

    fn titration(&self) -> TitrationPolicy {
        TitrationPolicy {
            start: 240,
            floor: 60,
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
        let (text, total) = loop {
            let pair = Self::sample_chain(rng);
            if Some(&pair.0) != self.last_text.as_ref() {
                break pair;
            }
        };
        self.last_text = Some(text.clone());

        let truthful = rng.random_bool(0.5);
        let claimed = if truthful {
            total
        } else {
            // Off-by-one-or-two lure, kept non-negative.
            loop {
                let delta = rng.random_range(1..=2);
                let claimed = if rng.random_bool(0.5) {
                    total + delta
                } else {
                    total - delta
                };
                if claimed >= 0 {
                    break claimed;
                }
            }
        };

        TrialSetup {
            kind: StimulusKind::Equation { text, claimed },
            condition: if truthful { "true" } else { "lure" }.to_string(),
        }
    }

    fn grade(&self, setup: &TrialSetup, key: ResponseKey) -> Option<bool> {
        let StimulusKind::Equation { text, claimed } = &setup.kind else {
            return Some(false);
        };
        let truth = eval_chain(text);
        let claim_is_true = truth == Some(*claimed);
        Some(match key {
            ResponseKey::J => claim_is_true,
            ResponseKey::F => !claim_is_true,
            _ => false,
        })
    }
}

/// Evaluate `a ± b ± c` left to right.
fn eval_chain(text: &str) -> Option<i32> {
    let mut tokens = text.split_whitespace();
    let mut value: i32 = tokens.next()?.parse().ok()?;
    while let Some(op) = tokens.next() {
        let operand: i32 = tokens.next()?.parse().ok()?;
        match op {
            "+" => value += operand,
            "\u{2212}" | "-" => value -= operand,
            _ => return None,
        }
    }
    Some(value)
}
