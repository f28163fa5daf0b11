use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::recovery::RecoveryLimits;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Bytes of a PDF-like file scanned for text; the rest is ignored.
    pub max_scan_bytes: usize,
    /// Lines searched for a header row.
    pub header_scan_lines: usize,
    /// Lines searched for a data row when no header exists.
    pub inference_scan_lines: usize,
    /// Emit placeholder rows when nothing parses.
    pub sample_fallback: bool,
    /// Run the trigger-keyword line scan before settling for sample rows.
    pub keyword_scan: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_scan_bytes: 500_000,
            header_scan_lines: 50,
            inference_scan_lines: 100,
            sample_fallback: true,
            keyword_scan: true,
        }
    }
}

impl Settings {
    pub fn recovery_limits(&self) -> RecoveryLimits {
        RecoveryLimits {
            max_bytes: self.max_scan_bytes,
            ..RecoveryLimits::default()
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("passbook")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

/// Missing or unreadable files yield defaults; unknown keys are ignored.
pub fn load_settings_from(path: &Path) -> Settings {
    if !path.exists() {
        return Settings::default();
    }
    let content = std::fs::read_to_string(path).unwrap_or_default();
    serde_json::from_str(&content).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "ignoring malformed settings file");
        Settings::default()
    })
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(settings, &settings_path())
}

pub fn save_settings_to(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json =
        serde_json::to_string_pretty(settings).map_err(|e| Error::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}
