//! Block and overall-trial numbering, derived solely from what has already
//! been persisted for this participant and task.

use crate::error::Result;
use crate::log::TrialLog;

/// Where the next block starts: its block number, and the overall ordinal of
/// its first trial. Computed once at block start and held for the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencePosition {
    pub block: u32,
    pub overall_trial: u32,
}

/// Numbering for a new block. A missing or empty log is the normal first-run
/// case and yields block 1, trial 1.
pub fn next_position(log: &dyn TrialLog) -> Result<SequencePosition> {
    if !log.exists() || log.is_empty()? {
        return Ok(SequencePosition {
            block: 1,
            overall_trial: 1,
        });
    }
    let rows = log.read_all()?;
    let block = rows.iter().map(|r| r.block).max().unwrap_or(0) + 1;
    Ok(SequencePosition {
        block,
        overall_trial: rows.len() as u32 + 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::MemoryTrialLog;
    use cogbat_core::TrialRecord;

    fn row(block: u32, trial: u32, overall: u32) -> TrialRecord {
        TrialRecord::pending(3, block, trial, overall, "motion", "coh25", "coh25:left", 180)
    }

    #[test]
    fn empty_log_starts_at_one_one() {
        let log = MemoryTrialLog::new();
        let pos = next_position(&log).unwrap();
        assert_eq!(pos.block, 1);
        assert_eq!(pos.overall_trial, 1);
    }

    #[test]
    fn numbering_continues_from_persisted_rows() {
        let log = MemoryTrialLog::with_rows(vec![
            row(1, 1, 1),
            row(1, 2, 2),
            row(2, 1, 3),
            row(2, 2, 4),
            row(3, 1, 5),
        ]);
        let pos = next_position(&log).unwrap();
        assert_eq!(pos.block, 4);
        assert_eq!(pos.overall_trial, 6);
    }

    #[test]
    fn block_number_comes_from_the_max_not_the_last_row() {
        // Rows are appended in order, but the max is what matters.
        let log = MemoryTrialLog::with_rows(vec![row(2, 1, 1), row(2, 2, 2)]);
        let pos = next_position(&log).unwrap();
        assert_eq!(pos.block, 3);
        assert_eq!(pos.overall_trial, 3);
    }
}
