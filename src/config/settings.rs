//! Configuration settings for Dubba.

use crate::audio::MixSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub dubbing: DubbingSettings,
    pub audio: AudioSettings,
}


/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.dubba".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Dubbing pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DubbingSettings {
    /// Target language code (e.g. "cat", "ca-ES").
    pub target_language: String,
    /// Directory holding the ledger, chunks, and assembled output.
    pub output_dir: String,
    /// Fields tracked with independent per-field fingerprints.
    pub tracked_fields: Vec<String>,
}

impl Default for DubbingSettings {
    fn default() -> Self {
        Self {
            target_language: "cat".to_string(),
            output_dir: "~/.dubba/output".to_string(),
            tracked_fields: crate::ledger::DEFAULT_TRACKED_FIELDS
                .iter()
                .map(|f| f.to_string())
                .collect(),
        }
    }
}

/// Mixing and normalization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Gain offset for the vocals track, decibels.
    pub vocals_gain_db: f64,
    /// Gain offset for the background track, decibels.
    pub background_gain_db: f64,
    /// Background peak amplitude above which normalization kicks in.
    pub normalization_threshold: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            vocals_gain_db: 5.0,
            background_gain_db: 0.0,
            normalization_threshold: 0.1,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::DubbaError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dubba")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded output directory path.
    pub fn output_dir(&self) -> PathBuf {
        Self::expand_path(&self.dubbing.output_dir)
    }

    /// Mixing knobs for the assembler.
    pub fn mix_settings(&self) -> MixSettings {
        MixSettings {
            vocals_gain_db: self.audio.vocals_gain_db,
            background_gain_db: self.audio.background_gain_db,
            normalization_threshold: self.audio.normalization_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.dubbing.target_language, "cat");
        assert_eq!(settings.audio.vocals_gain_db, 5.0);
        assert_eq!(settings.audio.normalization_threshold, 0.1);
        assert_eq!(
            settings.dubbing.tracked_fields,
            vec!["assigned_voice".to_string(), "speaker_id".to_string()]
        );
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.dubbing.target_language = "ca-ES".to_string();
        settings.audio.background_gain_db = -3.0;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.dubbing.target_language, "ca-ES");
        assert_eq!(loaded.audio.background_gain_db, -3.0);
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let path = PathBuf::from("/nonexistent/dubba/config.toml");
        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.dubbing.target_language, "cat");
    }
}
