use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Frame duration assumed before calibration has produced samples (60 Hz).
pub const NOMINAL_FRAME_S: f64 = 1.0 / 60.0;

/// Trait for high-precision timers
pub trait Timer: Clone + Send + Sync {
    type Timestamp: Copy + Clone + Send + Sync;
    fn now(&self) -> Self::Timestamp;
    fn elapsed(&self, ts: Self::Timestamp) -> Duration;
    fn sleep(&self, d: Duration);
    fn record_frame(&mut self, d: Duration);
    fn frame_count(&self) -> usize;
    fn calibration_stats(&self) -> CalibrationStats;
}

/// Frame-time statistics gathered during the calibration phase. Deadlines
/// are denominated in frames, so the calibrated frame duration is what turns
/// ms-denominated config into frame counts.
#[derive(Debug, Clone)]
pub struct CalibrationStats {
    pub average_frame_time_ns: f64,
    pub jitter_ns: f64,
    pub min_frame_time_ns: f64,
    pub max_frame_time_ns: f64,
    pub effective_fps: f64,
}

impl CalibrationStats {
    /// Duration of one frame in seconds; nominal 60 Hz until samples exist.
    pub fn frame_s(&self) -> f64 {
        if self.average_frame_time_ns > 0.0 {
            self.average_frame_time_ns / 1e9
        } else {
            NOMINAL_FRAME_S
        }
    }

    /// Number of whole frames covering `ms` milliseconds, never zero.
    pub fn frames_for_ms(&self, ms: u64) -> u32 {
        let frames = (ms as f64 / 1000.0 / self.frame_s()).round() as u32;
        frames.max(1)
    }

    /// Safety margin derived from observed jitter.
    pub fn safe_margin_ns(&self) -> u64 {
        (self.jitter_ns * 3.0) as u64
    }
}

/// Monotonic timer with a bounded ring of frame-time samples.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    start: Instant,
    frame_times: VecDeque<Duration>,
    frames_recorded: usize,
    max_samples: usize,
}

impl Timer for FrameTimer {
    type Timestamp = u64;

    fn now(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }

    fn elapsed(&self, ts: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(ts))
    }

    fn sleep(&self, d: Duration) {
        self.high_precision_sleep(d)
    }

    fn record_frame(&mut self, d: Duration) {
        if self.frame_times.len() >= self.max_samples {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(d);
        self.frames_recorded += 1;
    }

    fn frame_count(&self) -> usize {
        self.frames_recorded
    }

    fn calibration_stats(&self) -> CalibrationStats {
        let times: Vec<f64> = self
            .frame_times
            .iter()
            .map(|d| d.as_nanos() as f64)
            .collect();
        if times.is_empty() {
            return CalibrationStats {
                average_frame_time_ns: 0.0,
                jitter_ns: 0.0,
                min_frame_time_ns: 0.0,
                max_frame_time_ns: 0.0,
                effective_fps: 0.0,
            };
        }
        let avg = times.iter().sum::<f64>() / times.len() as f64;
        let var = times.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / times.len() as f64;
        let min = times.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = times.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        CalibrationStats {
            average_frame_time_ns: avg,
            jitter_ns: var.sqrt(),
            min_frame_time_ns: min,
            max_frame_time_ns: max,
            effective_fps: if avg > 0.0 { 1e9 / avg } else { 0.0 },
        }
    }
}

impl FrameTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            frame_times: VecDeque::with_capacity(1000),
            frames_recorded: 0,
            max_samples: 1000,
        }
    }

    /// Seconds since the timer was created.
    pub fn elapsed_s(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    pub fn high_precision_sleep(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        #[cfg(target_os = "windows")]
        self.windows_sleep(duration);
        #[cfg(target_os = "linux")]
        self.linux_sleep(duration);
        #[cfg(target_os = "macos")]
        self.macos_sleep(duration);
        #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
        std::thread::sleep(duration);
    }

    #[cfg(target_os = "windows")]
    fn windows_sleep(&self, duration: Duration) {
        use windows::Win32::Foundation::CloseHandle;
        use windows::Win32::System::Threading::{
            CreateWaitableTimerW, SetWaitableTimer, WaitForSingleObject, INFINITE,
        };

        unsafe {
            let Ok(timer) = CreateWaitableTimerW(None, true, None) else {
                std::thread::sleep(duration);
                return;
            };
            // Negative due time = relative, in 100 ns intervals.
            let due = -(duration.as_nanos() as i64 / 100);
            if SetWaitableTimer(timer, &due, 0, None, None, false).is_ok() {
                WaitForSingleObject(timer, INFINITE);
            } else {
                std::thread::sleep(duration);
            }
            let _ = CloseHandle(timer);
        }
    }

    #[cfg(target_os = "linux")]
    fn linux_sleep(&self, duration: Duration) {
        use libc::{clock_nanosleep, timespec, CLOCK_MONOTONIC};

        let req = timespec {
            tv_sec: duration.as_secs() as libc::time_t,
            tv_nsec: duration.subsec_nanos() as libc::c_long,
        };

        unsafe {
            clock_nanosleep(CLOCK_MONOTONIC, 0, &req, std::ptr::null_mut());
        }
    }

    #[cfg(target_os = "macos")]
    fn macos_sleep(&self, duration: Duration) {
        use mach2::mach_time::{mach_absolute_time, mach_timebase_info, mach_timebase_info_data_t};

        // Spin only for sub-100 us waits; the scheduler is fine above that.
        if duration.as_nanos() < 100_000 {
            unsafe {
                let start = mach_absolute_time();
                let mut timebase = mach_timebase_info_data_t { numer: 0, denom: 0 };
                mach_timebase_info(&mut timebase);

                let target_ticks =
                    duration.as_nanos() as u64 * timebase.denom as u64 / timebase.numer as u64;

                while mach_absolute_time() - start < target_ticks {
                    std::hint::spin_loop();
                }
            }
        } else {
            std::thread::sleep(duration);
        }
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Ask the OS scheduler for fine-grained timing for the life of the run.
/// No-op everywhere but Windows.
pub fn request_fine_scheduling() {
    #[cfg(target_os = "windows")]
    unsafe {
        windows::Win32::Media::timeBeginPeriod(1);
    }
}

/// Undo `request_fine_scheduling`.
pub fn release_fine_scheduling() {
    #[cfg(target_os = "windows")]
    unsafe {
        windows::Win32::Media::timeEndPeriod(1);
    }
}
