pub mod config;
pub mod error;
pub mod intake;
pub mod log;
pub mod pulse;
pub mod runner;
pub mod sequence;
pub mod session;
pub mod task;
pub mod titration;
pub mod vigilance;
pub mod window;

pub use config::BatteryConfig;
pub use error::{Result, SessionError};
pub use log::{CsvTrialLog, MemoryTrialLog, TrialLog, LOG_SCHEMA_VERSION};
pub use pulse::{NoopPulse, PulsePort};
pub use runner::{BlockOutcome, RunnerEvent, RunnerView, TaskRunner};
pub use sequence::{next_position, SequencePosition};
pub use session::{Participant, Session};
pub use task::{Task, TrialSetup};
pub use titration::{next_deadline, DeadlineTracker, TitrationPolicy};
pub use vigilance::MissStreakMonitor;
pub use window::PerformanceWindow;
