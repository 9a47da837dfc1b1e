//! The generic frame-locked trial loop. One runner drives any `Task`:
//! fixation, response window (deadline in frames), feedback, inter-trial
//! interval; per-trial log appends; titration and miss-streak bookkeeping.
//! Rendering and input stay outside: the app calls `tick` once per display
//! refresh and forwards key presses.

use cogbat_core::{FeedbackKind, ResponseKey, Stimulus, StimulusKind, TrialRecord, TrialState};
use cogbat_timing::{CalibrationStats, Timer};
use rand::{Rng, RngCore};

use crate::config::BatteryConfig;
use crate::error::Result;
use crate::log::TrialLog;
use crate::pulse::{codes, PulsePort};
use crate::sequence::{next_position, SequencePosition};
use crate::task::{Task, TrialSetup};
use crate::titration::DeadlineTracker;
use crate::vigilance::MissStreakMonitor;
use crate::window::PerformanceWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockOutcome {
    Completed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunnerEvent {
    TrialRecorded {
        trial: u32,
        correct: Option<bool>,
        missed: bool,
    },
    InterruptRaised,
    BlockFinished(BlockOutcome),
}

/// Snapshot the renderer consumes.
pub struct RunnerView<'a> {
    pub task_name: &'static str,
    pub state: Option<TrialState>,
    pub stimulus: Option<&'a StimulusKind>,
    pub frames_in_state: u32,
    pub deadline_frames: u32,
    /// (trials completed, trials per block)
    pub progress: (u32, u32),
    pub block: u32,
    pub interrupted: bool,
    pub feedback: Option<FeedbackKind>,
}

struct TrialInFlight {
    setup: TrialSetup,
    record: TrialRecord,
    state: TrialState,
    frames_in_state: u32,
    fixation_frames: u32,
    onset_ns: Option<u64>,
}

enum Step {
    Stay,
    Miss,
    FinishTrial,
}

pub struct TaskRunner<T, L>
where
    T: Timer<Timestamp = u64>,
    L: TrialLog,
{
    task: Box<dyn Task>,
    log: L,
    /// Zero point is the task start; `now()` feeds elapsed_s and RTs.
    timer: T,
    pulse: Box<dyn PulsePort>,
    frame_s: f64,
    fixation_range_ms: (u64, u64),
    feedback_frames: u32,
    iti_frames: u32,
    participant: u32,

    position: SequencePosition,
    in_block: bool,
    trial_in_block: u32,
    completed_in_block: u32,
    blocks_run: u32,

    tracker: DeadlineTracker,
    monitor: MissStreakMonitor,
    window: PerformanceWindow,
    current: Option<TrialInFlight>,
    interrupted: bool,
    last_feedback: Option<FeedbackKind>,
}

impl<T, L> TaskRunner<T, L>
where
    T: Timer<Timestamp = u64>,
    L: TrialLog,
{
    pub fn new(
        task: Box<dyn Task>,
        log: L,
        timer: T,
        pulse: Box<dyn PulsePort>,
        stats: &CalibrationStats,
        config: &BatteryConfig,
        participant: u32,
    ) -> Self {
        let tracker = DeadlineTracker::new(task.titration());
        let monitor = MissStreakMonitor::new(task.miss_streak_threshold());
        Self {
            frame_s: stats.frame_s(),
            fixation_range_ms: config.fixation_range_ms,
            feedback_frames: stats.frames_for_ms(config.feedback_ms),
            iti_frames: stats.frames_for_ms(config.intertrial_ms),
            participant,
            position: SequencePosition {
                block: 1,
                overall_trial: 1,
            },
            in_block: false,
            trial_in_block: 0,
            completed_in_block: 0,
            blocks_run: 0,
            tracker,
            monitor,
            window: PerformanceWindow::new(),
            current: None,
            interrupted: false,
            last_feedback: None,
            task,
            log,
            timer,
            pulse,
        }
    }

    pub fn task_name(&self) -> &'static str {
        self.task.name()
    }

    pub fn instructions(&self) -> &'static str {
        self.task.instructions()
    }

    pub fn response_keys(&self) -> &'static [ResponseKey] {
        self.task.keys()
    }

    pub fn blocks_run(&self) -> u32 {
        self.blocks_run
    }

    pub fn has_more_blocks(&self) -> bool {
        self.blocks_run < self.task.blocks()
    }

    pub fn in_block(&self) -> bool {
        self.in_block
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    /// Start the next block: numbering from the persisted log, fresh
    /// titration and vigilance state, first trial queued.
    pub fn begin_block(&mut self, rng: &mut dyn RngCore) -> Result<()> {
        self.position = next_position(&self.log)?;
        self.trial_in_block = 0;
        self.completed_in_block = 0;
        self.window.reset();
        self.tracker = DeadlineTracker::new(self.task.titration());
        self.monitor = MissStreakMonitor::new(self.task.miss_streak_threshold());
        self.interrupted = false;
        self.last_feedback = None;
        self.in_block = true;
        self.start_trial(rng);
        Ok(())
    }

    /// One display refresh. No-op while the reminder is up.
    pub fn tick(&mut self, rng: &mut dyn RngCore) -> Result<Vec<RunnerEvent>> {
        let mut events = Vec::new();
        if !self.in_block || self.interrupted {
            return Ok(events);
        }

        let step = match self.current.as_mut() {
            None => return Ok(events),
            Some(trial) => {
                trial.frames_in_state += 1;
                match trial.state {
                    TrialState::Fixation => {
                        if trial.frames_in_state >= trial.fixation_frames {
                            trial.state = TrialState::Response;
                            trial.frames_in_state = 0;
                            trial.onset_ns = Some(self.timer.now());
                            self.pulse.send(codes::TRIAL_ONSET);
                        }
                        Step::Stay
                    }
                    TrialState::Response => {
                        if trial.frames_in_state >= trial.record.deadline_frames {
                            Step::Miss
                        } else {
                            Step::Stay
                        }
                    }
                    TrialState::Feedback => {
                        if trial.frames_in_state >= self.feedback_frames {
                            trial.state = TrialState::Interval;
                            trial.frames_in_state = 0;
                        }
                        Step::Stay
                    }
                    TrialState::Interval => {
                        if trial.frames_in_state >= self.iti_frames {
                            trial.state = TrialState::Complete;
                            Step::FinishTrial
                        } else {
                            Step::Stay
                        }
                    }
                    TrialState::Complete => Step::FinishTrial,
                }
            }
        };

        match step {
            Step::Stay => {}
            Step::Miss => self.resolve(None, &mut events)?,
            Step::FinishTrial => {
                self.current = None;
                if self.completed_in_block >= self.task.trials_per_block() {
                    self.in_block = false;
                    self.blocks_run += 1;
                    events.push(RunnerEvent::BlockFinished(BlockOutcome::Completed));
                } else {
                    self.start_trial(rng);
                }
            }
        }

        Ok(events)
    }

    /// A response key from the event loop. While the reminder is up, any
    /// response key acknowledges it and nothing is scored.
    pub fn key(&mut self, key: ResponseKey) -> Result<Vec<RunnerEvent>> {
        if self.interrupted {
            self.interrupted = false;
            return Ok(Vec::new());
        }
        let accepts = match self.current.as_ref() {
            Some(trial) => trial.state == TrialState::Response,
            None => false,
        };
        if !accepts || !self.task.keys().contains(&key) {
            return Ok(Vec::new());
        }
        self.pulse.send(codes::RESPONSE);
        let mut events = Vec::new();
        self.resolve(Some(key), &mut events)?;
        Ok(events)
    }

    /// Abort only the current block; persisted rows stay, the in-flight
    /// trial is discarded unwritten.
    pub fn skip_block(&mut self) -> RunnerEvent {
        self.current = None;
        self.in_block = false;
        self.interrupted = false;
        self.last_feedback = None;
        self.blocks_run += 1;
        RunnerEvent::BlockFinished(BlockOutcome::Skipped)
    }

    /// Append the between-block rating response as a continuation row of the
    /// block just finished.
    pub fn record_rating(&mut self, digit: u8) -> Result<()> {
        let rows = self.log.read_all()?;
        let block = rows
            .iter()
            .map(|r| r.block)
            .max()
            .unwrap_or(self.position.block);
        let trial = rows
            .iter()
            .filter(|r| r.block == block)
            .map(|r| r.trial)
            .max()
            .unwrap_or(0)
            + 1;
        let mut record = TrialRecord::pending(
            self.participant,
            block,
            trial,
            rows.len() as u32 + 1,
            self.task.name(),
            "rating",
            "effort-rating-1-9",
            1,
        );
        record.response = Some(ResponseKey::Digit(digit).symbol().to_string());
        record.elapsed_s = self.now_s();
        self.log.append(&record)?;
        Ok(())
    }

    pub fn view(&self) -> RunnerView<'_> {
        let state = self.current.as_ref().map(|t| t.state);
        let stimulus = self.current.as_ref().and_then(|t| {
            (t.state == TrialState::Response).then_some(&t.setup.kind)
        });
        RunnerView {
            task_name: self.task.name(),
            state,
            stimulus,
            frames_in_state: self.current.as_ref().map_or(0, |t| t.frames_in_state),
            deadline_frames: self
                .current
                .as_ref()
                .map_or_else(|| self.tracker.current(), |t| t.record.deadline_frames),
            progress: (self.completed_in_block, self.task.trials_per_block()),
            block: self.position.block,
            interrupted: self.interrupted,
            feedback: self.last_feedback,
        }
    }

    fn now_s(&self) -> f64 {
        self.timer.now() as f64 / 1e9
    }

    fn frames_for_ms(&self, ms: u64) -> u32 {
        ((ms as f64 / 1000.0 / self.frame_s).round() as u32).max(1)
    }

    fn start_trial(&mut self, rng: &mut dyn RngCore) {
        self.trial_in_block += 1;
        let setup: TrialSetup = self.task.next_trial(rng);
        let deadline = self.tracker.current();
        let (lo, hi) = self.fixation_range_ms;
        let fixation_ms = if lo >= hi { lo } else { rng.random_range(lo..=hi) };
        let record = TrialRecord::pending(
            self.participant,
            self.position.block,
            self.trial_in_block,
            self.position.overall_trial + self.completed_in_block,
            self.task.name(),
            &setup.condition,
            &setup.kind.label(),
            deadline,
        );
        self.current = Some(TrialInFlight {
            setup,
            record,
            state: TrialState::Fixation,
            frames_in_state: 0,
            fixation_frames: self.frames_for_ms(fixation_ms),
            onset_ns: None,
        });
        self.last_feedback = None;
    }

    /// Close out the in-flight trial: fill the record, append it, update the
    /// performance window, titration and miss-streak state.
    fn resolve(&mut self, response: Option<ResponseKey>, events: &mut Vec<RunnerEvent>) -> Result<()> {
        let Some(mut trial) = self.current.take() else {
            return Ok(());
        };

        let correct = match response {
            Some(key) => {
                let onset = trial.onset_ns.unwrap_or_else(|| self.timer.now());
                let deadline_s = trial.record.deadline_frames as f64 * self.frame_s;
                let rt = self.timer.elapsed(onset).as_secs_f64().min(deadline_s);
                let correct = self.task.grade(&trial.setup, key);
                trial.record.response = Some(key.symbol().to_string());
                trial.record.rt_s = Some(rt);
                trial.record.correct = correct;
                correct
            }
            None => None,
        };
        trial.record.elapsed_s = self.now_s();
        debug_assert!(trial.record.rt_fits_deadline(self.frame_s));

        self.log.append(&trial.record)?;
        self.window.push(trial.record.correct, trial.record.rt_s);
        self.tracker.observe(self.window.outcomes());
        self.completed_in_block += 1;
        self.pulse.send(codes::TRIAL_END);

        self.last_feedback = Some(match (response.is_some(), correct) {
            (false, _) => FeedbackKind::Missed,
            (true, Some(true)) => FeedbackKind::Correct,
            (true, Some(false)) => FeedbackKind::Incorrect,
            (true, None) => FeedbackKind::Noted,
        });

        events.push(RunnerEvent::TrialRecorded {
            trial: trial.record.trial,
            correct: trial.record.correct,
            missed: trial.record.is_miss(),
        });

        if self.monitor.should_interrupt(self.window.rts()) {
            self.interrupted = true;
            events.push(RunnerEvent::InterruptRaised);
        }

        trial.state = TrialState::Feedback;
        trial.frames_in_state = 0;
        self.current = Some(trial);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::MemoryTrialLog;
    use crate::titration::TitrationPolicy;
    use cogbat_core::InkColor;
    use cogbat_timing::FrameTimer;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    struct StubTask;

    impl Task for StubTask {
        fn name(&self) -> &'static str {
            "stub"
        }
        fn instructions(&self) -> &'static str {
            "Press D."
        }
        fn keys(&self) -> &'static [ResponseKey] {
            &[ResponseKey::D, ResponseKey::F]
        }
        fn trials_per_block(&self) -> u32 {
            2
        }
        fn titration(&self) -> TitrationPolicy {
            TitrationPolicy {
                start: 2,
                floor: 1,
                tighten: 1,
                relax: 1,
                rescue: 2,
                accuracy_pivot: 0.8,
            }
        }
        fn miss_streak_threshold(&self) -> usize {
            2
        }
        fn next_trial(&mut self, _rng: &mut dyn RngCore) -> TrialSetup {
            TrialSetup {
                kind: StimulusKind::Word {
                    text: "RED",
                    ink: InkColor::Red,
                },
                condition: "congruent".to_string(),
            }
        }
        fn grade(&self, _setup: &TrialSetup, key: ResponseKey) -> Option<bool> {
            Some(key == ResponseKey::D)
        }
    }

    fn test_runner() -> TaskRunner<FrameTimer, MemoryTrialLog> {
        let mut config = BatteryConfig::default();
        // One frame per non-response state keeps the schedule deterministic.
        config.fixation_range_ms = (0, 0);
        config.feedback_ms = 0;
        config.intertrial_ms = 0;
        let timer = FrameTimer::new();
        let stats = timer.calibration_stats();
        TaskRunner::new(
            Box::new(StubTask),
            MemoryTrialLog::new(),
            timer,
            Box::new(crate::pulse::NoopPulse),
            &stats,
            &config,
            42,
        )
    }

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(7)
    }

    /// Tick until the runner reaches the response window.
    fn tick_to_response(
        runner: &mut TaskRunner<FrameTimer, MemoryTrialLog>,
        rng: &mut SmallRng,
    ) {
        for _ in 0..10 {
            runner.tick(rng).unwrap();
            if runner.view().state == Some(TrialState::Response) {
                return;
            }
        }
        panic!("never reached the response window");
    }

    fn drain_until_block_end(
        runner: &mut TaskRunner<FrameTimer, MemoryTrialLog>,
        rng: &mut SmallRng,
        max_ticks: usize,
    ) -> Vec<RunnerEvent> {
        let mut all = Vec::new();
        for _ in 0..max_ticks {
            let events = runner.tick(rng).unwrap();
            let done = events
                .iter()
                .any(|e| matches!(e, RunnerEvent::BlockFinished(_)));
            all.extend(events);
            if runner.view().interrupted {
                // Acknowledge the reminder the way a participant would.
                runner.key(ResponseKey::D).unwrap();
            }
            if done {
                return all;
            }
        }
        panic!("block never finished");
    }

    #[test]
    fn deadline_expiry_records_a_miss() {
        let mut runner = test_runner();
        let mut rng = rng();
        runner.begin_block(&mut rng).unwrap();
        tick_to_response(&mut runner, &mut rng);

        // Deadline is 2 frames; two more ticks time the trial out.
        runner.tick(&mut rng).unwrap();
        let events = runner.tick(&mut rng).unwrap();
        assert!(events.iter().any(|e| matches!(
            e,
            RunnerEvent::TrialRecorded { missed: true, .. }
        )));

        let rows = runner.log().rows();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].response.is_none());
        assert!(rows[0].rt_s.is_none());
        assert!(rows[0].correct.is_none());
        assert_eq!(rows[0].deadline_frames, 2);
        assert_eq!(runner.view().feedback, Some(FeedbackKind::Missed));
    }

    #[test]
    fn response_is_graded_and_logged() {
        let mut runner = test_runner();
        let mut rng = rng();
        runner.begin_block(&mut rng).unwrap();
        tick_to_response(&mut runner, &mut rng);

        let events = runner.key(ResponseKey::D).unwrap();
        assert!(events.iter().any(|e| matches!(
            e,
            RunnerEvent::TrialRecorded {
                correct: Some(true),
                missed: false,
                ..
            }
        )));

        let rows = runner.log().rows();
        assert_eq!(rows[0].response.as_deref(), Some("d"));
        assert_eq!(rows[0].correct, Some(true));
        let rt = rows[0].rt_s.unwrap();
        assert!(rt >= 0.0);
        assert!(rows[0].rt_fits_deadline(1.0 / 60.0));
    }

    #[test]
    fn keys_outside_the_task_set_are_ignored() {
        let mut runner = test_runner();
        let mut rng = rng();
        runner.begin_block(&mut rng).unwrap();
        tick_to_response(&mut runner, &mut rng);

        assert!(runner.key(ResponseKey::K).unwrap().is_empty());
        assert!(runner.log().rows().is_empty());
    }

    #[test]
    fn keys_during_fixation_are_ignored() {
        let mut runner = test_runner();
        let mut rng = rng();
        runner.begin_block(&mut rng).unwrap();
        // Still in fixation: no tick has run.
        assert!(runner.key(ResponseKey::D).unwrap().is_empty());
        assert!(runner.log().rows().is_empty());
    }

    #[test]
    fn two_misses_raise_the_reminder_and_pause() {
        let mut runner = test_runner();
        let mut rng = rng();
        runner.begin_block(&mut rng).unwrap();

        let mut interrupted = false;
        for _ in 0..40 {
            let events = runner.tick(&mut rng).unwrap();
            if events.iter().any(|e| *e == RunnerEvent::InterruptRaised) {
                interrupted = true;
                break;
            }
        }
        assert!(interrupted);
        assert_eq!(runner.log().rows().len(), 2);

        // Paused: ticks do nothing until a key acknowledges.
        let before = runner.view().frames_in_state;
        runner.tick(&mut rng).unwrap();
        assert_eq!(runner.view().frames_in_state, before);
        assert!(runner.view().interrupted);

        runner.key(ResponseKey::D).unwrap();
        assert!(!runner.view().interrupted);
        // The acknowledging key scored nothing.
        assert_eq!(runner.log().rows().len(), 2);
    }

    #[test]
    fn skip_discards_the_in_flight_trial_only() {
        let mut runner = test_runner();
        let mut rng = rng();
        runner.begin_block(&mut rng).unwrap();
        tick_to_response(&mut runner, &mut rng);
        runner.key(ResponseKey::F).unwrap(); // trial 1 persisted, incorrect
        for _ in 0..4 {
            runner.tick(&mut rng).unwrap(); // into trial 2
        }

        let event = runner.skip_block();
        assert_eq!(event, RunnerEvent::BlockFinished(BlockOutcome::Skipped));
        assert_eq!(runner.log().rows().len(), 1);
        assert!(!runner.in_block());
        assert_eq!(runner.blocks_run(), 1);
    }

    #[test]
    fn numbering_continues_across_blocks_and_ratings() {
        let mut runner = test_runner();
        let mut rng = rng();

        runner.begin_block(&mut rng).unwrap();
        let events = drain_until_block_end(&mut runner, &mut rng, 200);
        assert!(events.contains(&RunnerEvent::BlockFinished(BlockOutcome::Completed)));
        runner.record_rating(6).unwrap();

        runner.begin_block(&mut rng).unwrap();
        drain_until_block_end(&mut runner, &mut rng, 200);

        let rows = runner.log().rows().to_vec();
        assert_eq!(rows.len(), 5); // 2 trials + rating + 2 trials
        assert_eq!(rows[2].condition, "rating");
        assert_eq!(rows[2].block, 1);
        assert_eq!(rows[2].trial, 3);
        assert_eq!(rows[2].response.as_deref(), Some("6"));
        assert_eq!(rows[3].block, 2);
        assert_eq!(rows[3].trial, 1);
        assert_eq!(rows[3].overall_trial, 4);
        assert_eq!(rows[4].overall_trial, 5);
        // Block numbers never decrease across the file.
        assert!(rows.windows(2).all(|w| w[0].block <= w[1].block));
    }

    #[test]
    fn titration_follows_the_block_history() {
        let mut runner = test_runner();
        let mut rng = rng();
        runner.begin_block(&mut rng).unwrap();

        // Trial 1 missed: accuracy undefined, relax step, floor respected.
        tick_to_response(&mut runner, &mut rng);
        runner.tick(&mut rng).unwrap();
        runner.tick(&mut rng).unwrap();
        // Trial 2 now carries deadline 3.
        for _ in 0..4 {
            runner.tick(&mut rng).unwrap();
        }
        let rows = runner.log().rows();
        assert_eq!(rows[0].deadline_frames, 2);
        assert_eq!(runner.view().deadline_frames, 3);
    }
}
