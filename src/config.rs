//! Engine configuration — invocation limits loaded from ~/.clipshaper/engine.yaml.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Limits and defaults applied to every invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of clips slicing may produce in one invocation.
    #[serde(default = "EngineConfig::default_max_slices")]
    pub max_slices: usize,
    /// Maximum number of notes in a selection.
    #[serde(default = "EngineConfig::default_max_notes")]
    pub max_notes: usize,
    /// Seed used when the request carries none. None = wall clock.
    #[serde(default)]
    pub default_seed: Option<u64>,
}

impl EngineConfig {
    fn default_max_slices() -> usize {
        100
    }

    fn default_max_notes() -> usize {
        10_000
    }

    /// Standard config path.
    pub fn default_path() -> Option<PathBuf> {
        Some(dirs::home_dir()?.join(".clipshaper").join("engine.yaml"))
    }

    /// Load config from the standard path (~/.clipshaper/engine.yaml).
    /// Returns None if the file doesn't exist or can't be parsed.
    pub fn load() -> Option<Self> {
        let path = Self::default_path()?;
        Self::load_from(&path).ok()
    }

    pub fn load_from(path: &Path) -> Result<Self, io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Save as YAML, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self).map_err(io::Error::other)?;
        std::fs::write(path, yaml)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_slices: Self::default_max_slices(),
            max_notes: Self::default_max_notes(),
            default_seed: None,
        }
    }
}
