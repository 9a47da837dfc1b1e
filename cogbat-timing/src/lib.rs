mod timer;

pub use timer::{
    release_fine_scheduling, request_fine_scheduling, CalibrationStats, FrameTimer, Timer,
    NOMINAL_FRAME_S,
};
