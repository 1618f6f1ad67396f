use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Name of the optional settings file looked up in the working directory.
pub const SETTINGS_FILE: &str = "freqview.json";

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Directories and column names used by both binaries.
///
/// Every field has a default, so a settings file only needs to name what it
/// overrides:
///
/// ```json
/// { "raw_data_dir": "sweeps/2023", "output_dir": "combined" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory scanned for `*.txt` measurement files.
    pub raw_data_dir: PathBuf,
    /// Directory the batch tool writes combined files into.
    pub output_dir: PathBuf,
    /// Column holding the oscillator frequency of each row.
    pub frequency_column: String,
    /// Channel the normalized output percentage is derived from.
    pub primary_channel: String,
    /// Name of the derived normalized output column.
    pub normalized_column: String,
    /// Columns starting with any of these prefixes are never offered as Y axis.
    pub reserved_prefixes: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            raw_data_dir: PathBuf::from("raw_data"),
            output_dir: PathBuf::from("."),
            frequency_column: "Oscilator_frequency (Hz)".to_string(),
            primary_channel: "Demod_4_X_A (V)".to_string(),
            normalized_column: "Normalized_Vout (%)".to_string(),
            reserved_prefixes: vec!["Demod_1".to_string(), "DemodAll".to_string()],
        }
    }
}

impl Settings {
    /// Read settings from `path`, falling back to defaults when the file does
    /// not exist. A file that exists but does not parse is an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&text)
            .with_context(|| format!("parsing settings file {}", path.display()))?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load_or_default(&dir.path().join(SETTINGS_FILE)).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, r#"{ "raw_data_dir": "sweeps" }"#).unwrap();

        let settings = Settings::load_or_default(&path).unwrap();
        assert_eq!(settings.raw_data_dir, PathBuf::from("sweeps"));
        assert_eq!(settings.frequency_column, "Oscilator_frequency (Hz)");
        assert_eq!(settings.reserved_prefixes, vec!["Demod_1", "DemodAll"]);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "{ not json").unwrap();
        assert!(Settings::load_or_default(&path).is_err());
    }
}
