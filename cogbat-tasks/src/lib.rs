//! The battery's six tasks, each a `Task` strategy consumed by the generic
//! runner in cogbat-session.

mod arithmetic;
mod effort;
mod motion;
mod search;
mod stroop;
mod switching;

pub use arithmetic::MentalMath;
pub use effort::EffortChoice;
pub use motion::DotMotion;
pub use search::VisualSearch;
pub use stroop::Stroop;
pub use switching::TaskSwitching;

use cogbat_session::Task;

/// Build a task from its config name; None for unknown names.
pub fn by_name(name: &str) -> Option<Box<dyn Task>> {
    match name {
        "stroop" => Some(Box::new(Stroop::new())),
        "switching" => Some(Box::new(TaskSwitching::new())),
        "arithmetic" => Some(Box::new(MentalMath::new())),
        "effort" => Some(Box::new(EffortChoice::new())),
        "motion" => Some(Box::new(DotMotion::new())),
        "search" => Some(Box::new(VisualSearch::new())),
        _ => None,
    }
}
