/// Defines battery phases and behavior
pub trait Phase: Copy + Clone + PartialEq + Send + Sync + std::fmt::Debug + Default {
    fn allows_input(&self) -> bool;
    fn requires_calibration(&self) -> bool;
    fn next(&self) -> Option<Self>;

    fn is_welcome(&self) -> bool {
        false
    }
    fn is_instructions(&self) -> bool {
        false
    }
    fn is_block(&self) -> bool {
        false
    }
    fn is_rest(&self) -> bool {
        false
    }
    fn is_debrief(&self) -> bool {
        false
    }
}

/// The battery's phase sequence. `Instructions`, `Block` and `Rest` repeat
/// per task; the orchestrator loops them, `next()` gives the forward edge.
#[derive(Copy, Debug, Clone, PartialEq, Default)]
pub enum BatteryPhase {
    #[default]
    Welcome,
    Calibration,
    Instructions,
    Block,
    Rest,
    Debrief,
}

impl Phase for BatteryPhase {
    fn allows_input(&self) -> bool {
        !matches!(self, Self::Calibration)
    }

    fn requires_calibration(&self) -> bool {
        matches!(self, Self::Calibration)
    }

    fn next(&self) -> Option<Self> {
        use BatteryPhase::*;
        Some(match self {
            Welcome => Calibration,
            Calibration => Instructions,
            Instructions => Block,
            Block => Rest,
            Rest => Debrief,
            Debrief => return None,
        })
    }

    fn is_welcome(&self) -> bool {
        matches!(self, BatteryPhase::Welcome)
    }

    fn is_instructions(&self) -> bool {
        matches!(self, BatteryPhase::Instructions)
    }

    fn is_block(&self) -> bool {
        matches!(self, BatteryPhase::Block)
    }

    fn is_rest(&self) -> bool {
        matches!(self, BatteryPhase::Rest)
    }

    fn is_debrief(&self) -> bool {
        matches!(self, BatteryPhase::Debrief)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_edges_terminate_at_debrief() {
        let mut phase = BatteryPhase::default();
        let mut hops = 0;
        while let Some(next) = phase.next() {
            phase = next;
            hops += 1;
        }
        assert_eq!(phase, BatteryPhase::Debrief);
        assert_eq!(hops, 5);
    }

    #[test]
    fn calibration_blocks_input() {
        assert!(!BatteryPhase::Calibration.allows_input());
        assert!(BatteryPhase::Block.allows_input());
    }
}
