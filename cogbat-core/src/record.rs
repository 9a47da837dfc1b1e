use serde::{Deserialize, Serialize};

/// Trial state machine events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialState {
    Fixation,
    Response,
    Feedback,
    Interval,
    Complete,
}

/// What the feedback screen should say about the trial just resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    Correct,
    Incorrect,
    Missed,
    /// Response taken on an unscored task.
    Noted,
}

/// One persisted row per attempted trial.
///
/// Created immediately before the stimulus is shown, mutated in place while
/// the response is captured, then appended immutably to the trial log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub participant: u32,
    pub block: u32,
    /// 1-based index within the block.
    pub trial: u32,
    /// 1-based position across every block persisted for this task.
    pub overall_trial: u32,
    pub task: String,
    pub condition: String,
    pub stimulus: String,
    pub response: Option<String>,
    /// Seconds from stimulus onset; None when the deadline expired.
    pub rt_s: Option<f64>,
    pub correct: Option<bool>,
    /// Wall-clock seconds since the task started.
    pub elapsed_s: f64,
    /// Response deadline used for this trial, in display frames. Always >= 1.
    pub deadline_frames: u32,
}

impl TrialRecord {
    /// A record for a trial that is about to be presented. Response fields
    /// stay empty until the trial resolves.
    #[allow(clippy::too_many_arguments)]
    pub fn pending(
        participant: u32,
        block: u32,
        trial: u32,
        overall_trial: u32,
        task: &str,
        condition: &str,
        stimulus: &str,
        deadline_frames: u32,
    ) -> Self {
        debug_assert!(deadline_frames >= 1);
        Self {
            participant,
            block,
            trial,
            overall_trial,
            task: task.to_string(),
            condition: condition.to_string(),
            stimulus: stimulus.to_string(),
            response: None,
            rt_s: None,
            correct: None,
            elapsed_s: 0.0,
            deadline_frames,
        }
    }

    /// Whether the recorded reaction time respects the deadline, given the
    /// calibrated duration of one frame in seconds.
    pub fn rt_fits_deadline(&self, frame_s: f64) -> bool {
        match self.rt_s {
            Some(rt) => rt >= 0.0 && rt <= self.deadline_frames as f64 * frame_s,
            None => true,
        }
    }

    pub fn is_miss(&self) -> bool {
        self.rt_s.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_record_has_no_outcome() {
        let r = TrialRecord::pending(7, 1, 1, 1, "stroop", "congruent", "RED/red", 90);
        assert!(r.response.is_none());
        assert!(r.rt_s.is_none());
        assert!(r.correct.is_none());
        assert!(r.is_miss());
    }

    #[test]
    fn rt_respects_deadline_in_frame_units() {
        let mut r = TrialRecord::pending(7, 1, 1, 1, "stroop", "congruent", "RED/red", 60);
        r.rt_s = Some(0.9);
        // 60 frames at 60 Hz is one second.
        assert!(r.rt_fits_deadline(1.0 / 60.0));
        r.rt_s = Some(1.1);
        assert!(!r.rt_fits_deadline(1.0 / 60.0));
    }
}
