use std::path::{Path, PathBuf};

use ab_glyph::FontVec;
use anyhow::{bail, Context, Result};

/// Well-known sans fonts, probed in order when no font is configured.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Load the stimulus font: the configured path first, then the system list.
pub fn load_font(configured: Option<&Path>) -> Result<FontVec> {
    if let Some(path) = configured {
        let bytes = std::fs::read(path)
            .with_context(|| format!("reading configured font {}", path.display()))?;
        return FontVec::try_from_vec(bytes)
            .with_context(|| format!("parsing configured font {}", path.display()));
    }

    for candidate in SYSTEM_FONTS.iter().map(PathBuf::from) {
        if !candidate.exists() {
            continue;
        }
        if let Ok(bytes) = std::fs::read(&candidate) {
            if let Ok(font) = FontVec::try_from_vec(bytes) {
                return Ok(font);
            }
        }
    }

    bail!("no usable font found; set `font` in cogbat.json to a .ttf path")
}
