//! Orchestrates the whole run: welcome → display calibration → per task:
//! instructions → blocks with rest/rating screens between them → debrief.
//! Owns the task queue and the active runner; the winit layer feeds it
//! frames and keys and asks it what to draw.

use std::collections::VecDeque;
use std::time::Duration;

use anyhow::Result;
use cogbat_core::{BatteryPhase, Phase, ResponseKey, TrialState};
use cogbat_render::Screen;
use cogbat_session::{
    pulse, BlockOutcome, CsvTrialLog, RunnerEvent, Session, Task, TaskRunner,
};
use cogbat_timing::{CalibrationStats, FrameTimer, Timer};
use rand::rngs::ThreadRng;

pub struct Battery {
    session: Session,
    phase: BatteryPhase,
    queue: VecDeque<Box<dyn Task>>,
    runner: Option<TaskRunner<FrameTimer, CsvTrialLog>>,
    /// Display frame samples; feeds the calibration phase.
    timer: FrameTimer,
    stats: CalibrationStats,
    calibrated: bool,
    rng: ThreadRng,
    finished: bool,
}

fn title_for(name: &str) -> &'static str {
    match name {
        "stroop" => "COLOR NAMING",
        "switching" => "TASK SWITCHING",
        "arithmetic" => "MENTAL ARITHMETIC",
        "effort" => "CHOICES",
        "motion" => "MOTION JUDGMENT",
        "search" => "VISUAL SEARCH",
        _ => "TASK",
    }
}

impl Battery {
    pub fn new(session: Session, tasks: Vec<Box<dyn Task>>) -> Self {
        let timer = FrameTimer::new();
        let stats = timer.calibration_stats();
        Self {
            session,
            phase: BatteryPhase::Welcome,
            queue: tasks.into(),
            runner: None,
            timer,
            stats,
            calibrated: false,
            rng: rand::rng(),
            finished: false,
        }
    }

    pub fn phase(&self) -> BatteryPhase {
        self.phase
    }

    pub fn finished(&self) -> bool {
        self.finished
    }

    pub fn record_frame(&mut self, d: Duration) {
        self.timer.record_frame(d);
    }

    /// One display refresh.
    pub fn tick(&mut self) -> Result<()> {
        match self.phase {
            BatteryPhase::Calibration => {
                if !self.calibrated
                    && self.timer.frame_count() >= self.session.config.calibration_frames
                {
                    self.stats = self.timer.calibration_stats();
                    self.calibrated = true;
                    println!(
                        "Calibration: {:.3} ms/frame, {:.1} Hz, jitter {:.3} ms",
                        self.stats.average_frame_time_ns / 1e6,
                        self.stats.effective_fps,
                        self.stats.jitter_ns / 1e6,
                    );
                    self.next_task_or_debrief();
                }
            }
            BatteryPhase::Block => {
                let events = match self.runner.as_mut() {
                    Some(runner) => runner.tick(&mut self.rng)?,
                    None => Vec::new(),
                };
                self.apply(events)?;
            }
            // Welcome, Instructions, Rest and Debrief advance on input.
            _ => {}
        }
        Ok(())
    }

    /// SPACE: advance through the input-driven phases.
    pub fn advance(&mut self) -> Result<()> {
        if !self.phase.allows_input() {
            return Ok(());
        }
        match self.phase {
            BatteryPhase::Welcome => {
                self.phase = self.phase.next().unwrap_or(BatteryPhase::Debrief);
            }
            BatteryPhase::Instructions => self.start_task()?,
            BatteryPhase::Debrief => {
                self.finished = true;
            }
            _ => {}
        }
        Ok(())
    }

    /// A response key from the event loop.
    pub fn respond(&mut self, key: ResponseKey) -> Result<()> {
        if !self.phase.allows_input() {
            return Ok(());
        }
        match self.phase {
            BatteryPhase::Block => {
                if let Some(runner) = self.runner.as_mut() {
                    let events = runner.key(key)?;
                    self.apply(events)?;
                }
            }
            BatteryPhase::Rest => {
                if let ResponseKey::Digit(d) = key {
                    if (1..=9).contains(&d) {
                        if let Some(runner) = self.runner.as_mut() {
                            runner.record_rating(d)?;
                            runner.begin_block(&mut self.rng)?;
                            self.phase = BatteryPhase::Block;
                        }
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// F9: abandon the current block, keep everything already written.
    pub fn skip_block(&mut self) -> Result<()> {
        if self.phase == BatteryPhase::Block {
            if let Some(runner) = self.runner.as_mut() {
                let event = runner.skip_block();
                println!("Block skipped by experimenter");
                self.apply(vec![event])?;
            }
        }
        Ok(())
    }

    pub fn screen(&self) -> Screen<'_> {
        match self.phase {
            BatteryPhase::Welcome => Screen::Welcome,
            BatteryPhase::Calibration => Screen::Calibrating,
            BatteryPhase::Instructions => {
                let (title, body) = self
                    .queue
                    .front()
                    .map(|t| (title_for(t.name()), t.instructions()))
                    .unwrap_or(("TASK", ""));
                Screen::Instructions { title, body }
            }
            BatteryPhase::Block => match self.runner.as_ref() {
                Some(runner) => {
                    let view = runner.view();
                    if view.interrupted {
                        Screen::Interrupt
                    } else {
                        Screen::Trial {
                            state: view.state.unwrap_or(TrialState::Interval),
                            stimulus: view.stimulus,
                            frame: view.frames_in_state,
                            progress: view.progress,
                            block: view.block,
                            feedback: view.feedback,
                        }
                    }
                }
                None => Screen::Debrief,
            },
            BatteryPhase::Rest => Screen::Rest,
            BatteryPhase::Debrief => Screen::Debrief,
        }
    }

    fn start_task(&mut self) -> Result<()> {
        let Some(task) = self.queue.pop_front() else {
            self.phase = BatteryPhase::Debrief;
            return Ok(());
        };
        let name = task.name();
        let log = self.session.open_log(name)?;
        let pulse = pulse::from_config(&self.session.config);
        let mut runner = TaskRunner::new(
            task,
            log,
            FrameTimer::new(),
            pulse,
            &self.stats,
            &self.session.config,
            self.session.participant.id,
        );
        runner.begin_block(&mut self.rng)?;
        println!("Task {} started", name);
        self.runner = Some(runner);
        self.phase = BatteryPhase::Block;
        Ok(())
    }

    fn apply(&mut self, events: Vec<RunnerEvent>) -> Result<()> {
        for event in events {
            match event {
                RunnerEvent::TrialRecorded {
                    trial,
                    correct,
                    missed,
                } => {
                    if missed {
                        println!("  trial {}: no response", trial);
                    } else {
                        println!("  trial {}: correct={:?}", trial, correct);
                    }
                }
                RunnerEvent::InterruptRaised => {
                    println!("  miss streak: pausing with reminder");
                }
                RunnerEvent::BlockFinished(outcome) => self.block_finished(outcome),
            }
        }
        Ok(())
    }

    fn block_finished(&mut self, outcome: BlockOutcome) {
        let more = match self.runner.as_ref() {
            Some(runner) => {
                println!(
                    "{} block {} {}",
                    runner.task_name(),
                    runner.blocks_run(),
                    match outcome {
                        BlockOutcome::Completed => "completed",
                        BlockOutcome::Skipped => "skipped",
                    }
                );
                runner.has_more_blocks()
            }
            None => false,
        };
        if more {
            self.phase = BatteryPhase::Rest;
        } else {
            self.runner = None;
            self.next_task_or_debrief();
        }
    }

    fn next_task_or_debrief(&mut self) {
        self.phase = if self.queue.is_empty() {
            BatteryPhase::Debrief
        } else {
            BatteryPhase::Instructions
        };
    }
}
