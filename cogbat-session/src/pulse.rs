//! Optional digital-pulse signaling to external recording equipment.
//! Fire-and-forget: ports must never block the frame loop, and the default
//! port does nothing at all.

use crate::config::BatteryConfig;

/// Event codes put on the wire.
pub mod codes {
    pub const TRIAL_ONSET: u8 = 1;
    pub const RESPONSE: u8 = 2;
    pub const TRIAL_END: u8 = 3;
}

pub trait PulsePort {
    fn send(&mut self, code: u8);
}

/// Default port when signaling is disabled.
pub struct NoopPulse;

impl PulsePort for NoopPulse {
    fn send(&mut self, _code: u8) {}
}

/// Stand-in port used when signaling is enabled but no hardware driver is
/// linked; prints the code so timing can be checked against the recording.
pub struct ConsolePulse;

impl PulsePort for ConsolePulse {
    fn send(&mut self, code: u8) {
        println!("[pulse] code {}", code);
    }
}

pub fn from_config(config: &BatteryConfig) -> Box<dyn PulsePort> {
    if config.send_pulses {
        Box::new(ConsolePulse)
    } else {
        Box::new(NoopPulse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_config_gets_the_noop_port() {
        let mut config = BatteryConfig::default();
        config.send_pulses = false;
        // Just exercising the seam; a no-op send must not panic.
        from_config(&config).send(codes::TRIAL_ONSET);
    }
}
