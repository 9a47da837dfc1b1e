pub mod keys;
pub mod phase;
pub mod record;
pub mod stimulus;

pub use keys::{ControlKey, ResponseKey};
pub use phase::{BatteryPhase, Phase};
pub use record::{FeedbackKind, TrialRecord, TrialState};
pub use stimulus::{Heading, InkColor, Offer, Stimulus, StimulusKind, SwitchCue};
