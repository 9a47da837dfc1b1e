//! The run-wide context object: who is being tested, under which config,
//! and where this run's logs go. Passed by reference into the task runners
//! instead of living in globals.

use chrono::{DateTime, Local};

use crate::config::BatteryConfig;
use crate::error::Result;
use crate::log::CsvTrialLog;

#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub id: u32,
    pub age: Option<u32>,
    /// Condition assignment label, e.g. a counterbalancing group.
    pub condition: String,
}

pub struct Session {
    pub participant: Participant,
    pub config: BatteryConfig,
    /// Run start; stamps every log filename of this run.
    pub started: DateTime<Local>,
}

impl Session {
    pub fn new(participant: Participant, config: BatteryConfig) -> Self {
        Self {
            participant,
            config,
            started: Local::now(),
        }
    }

    /// The trial log for one task of this run.
    pub fn open_log(&self, task: &str) -> Result<CsvTrialLog> {
        CsvTrialLog::create(
            &self.config.data_dir,
            task,
            self.participant.id,
            &self.started,
        )
    }
}
