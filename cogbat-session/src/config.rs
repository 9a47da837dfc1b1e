//! Battery-wide configuration. Everything has a default; a `cogbat.json`
//! next to the binary overrides fields selectively.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatteryConfig {
    /// Directory for trial logs.
    pub data_dir: PathBuf,
    /// Font file for stimulus text; falls back to system locations.
    pub font: Option<PathBuf>,
    /// Fire digital pulse codes at trial onset/response/end.
    pub send_pulses: bool,
    /// Uniform range the fixation duration is drawn from.
    pub fixation_range_ms: (u64, u64),
    pub feedback_ms: u64,
    pub intertrial_ms: u64,
    /// Frames sampled before the display calibration is applied.
    pub calibration_frames: usize,
    /// Task order; unknown names are reported and skipped.
    pub tasks: Vec<String>,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            font: None,
            send_pulses: false,
            fixation_range_ms: (500, 1500),
            feedback_ms: 500,
            intertrial_ms: 1000,
            calibration_frames: 120,
            tasks: vec![
                "stroop".into(),
                "switching".into(),
                "arithmetic".into(),
                "effort".into(),
                "motion".into(),
                "search".into(),
            ],
        }
    }
}

impl BatteryConfig {
    /// Load from `path` when it exists, defaults otherwise. A missing file
    /// is the common case, not an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let file = File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = BatteryConfig::load_or_default(&dir.path().join("cogbat.json")).unwrap();
        assert_eq!(cfg.tasks.len(), 6);
        assert!(!cfg.send_pulses);
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cogbat.json");
        std::fs::write(&path, r#"{"send_pulses": true, "tasks": ["stroop"]}"#).unwrap();
        let cfg = BatteryConfig::load_or_default(&path).unwrap();
        assert!(cfg.send_pulses);
        assert_eq!(cfg.tasks, vec!["stroop".to_string()]);
        assert_eq!(cfg.feedback_ms, 500);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cogbat.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(BatteryConfig::load_or_default(&path).is_err());
    }
}
