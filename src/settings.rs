//! Runtime settings with persistence
//!
//! Settings are saved to `~/.config/meridian/settings.toml`

use std::fs;
use std::path::{Path, PathBuf};

use meridian_streaming::LoaderConfig;
use meridian_world::QueryConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// All runtime settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeridianSettings {
    pub streaming: LoaderConfig,
    pub query: QueryConfig,
    pub simulation: SimulationSettings,
}

impl MeridianSettings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("meridian"))
    }

    /// Get the settings file path
    fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.toml"))
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => {
                warn!("Could not determine config directory");
                Self::default()
            }
        }
    }

    /// Load settings from `path`, falling back to defaults on any failure
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("No settings file found, using defaults");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match Self::parse(&content) {
                Ok(settings) => {
                    info!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    warn!("Failed to parse settings: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read settings file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Parse settings from TOML. Missing tables and keys take their defaults.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Save settings to disk
    pub fn save(&self) -> anyhow::Result<()> {
        let Some(path) = Self::settings_path() else {
            anyhow::bail!("Could not determine config directory");
        };
        self.save_to(&path)
    }

    /// Write settings to `path`, creating its parent directory if needed
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }
}

/// Settings for the simulated host session the binary runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Game time advanced per scheduler tick
    pub tick_ms: u64,
    /// Stop the session after this many ticks even if tasks are still live
    pub max_ticks: u64,
    /// Load latency given to every asset in the demo catalog
    pub asset_latency_ms: u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            tick_ms: 16,
            max_ticks: 2_000,
            asset_latency_ms: 120,
        }
    }
}
