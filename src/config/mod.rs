//! Configuration module

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::similarity::{CLEAR_DUPLICATE, LIKELY_DUPLICATE};

/// Name of the per-project directory, like `.git`
pub const SCOUT_DIR: &str = ".scout";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "SCOUT_DATA_DIR";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub dedup: DedupConfig,

    /// File this config was read from, used to resolve relative paths
    #[serde(skip)]
    origin: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DataConfig {
    /// Data directory; relative paths are taken from the config file's directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Threshold for listing candidates (`scout dupes`)
    #[serde(default = "default_report_threshold")]
    pub report_threshold: f64,

    /// Threshold for automatic merging (`scout resolve`)
    #[serde(default = "default_merge_threshold")]
    pub merge_threshold: f64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            report_threshold: default_report_threshold(),
            merge_threshold: default_merge_threshold(),
        }
    }
}

fn default_report_threshold() -> f64 {
    LIKELY_DUPLICATE
}

fn default_merge_threshold() -> f64 {
    CLEAR_DUPLICATE
}

impl Config {
    /// Load config from default locations
    pub fn load() -> Result<Self> {
        Self::load_with(None)
    }

    /// Load config from an explicit file, else local, else global, else defaults
    pub fn load_with(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        if let Some(local) = Self::find_local_config() {
            return Self::load_from(&local);
        }

        if let Some(global) = Self::global_config_path() {
            if global.exists() {
                return Self::load_from(&global);
            }
        }

        Ok(Self::default())
    }

    /// Load config from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.origin = Some(path.to_path_buf());
        Ok(config)
    }

    /// Save config to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Find local .scout directory walking up from the current directory
    pub fn find_local_dir() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            let dir = current.join(SCOUT_DIR);
            if dir.is_dir() {
                return Some(dir);
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Find local .scout/config.toml walking up directories
    pub fn find_local_config() -> Option<PathBuf> {
        Self::find_local_dir()
            .map(|dir| dir.join("config.toml"))
            .filter(|path| path.exists())
    }

    /// Global scout directory (~/.scout)
    pub fn global_dir() -> Option<PathBuf> {
        directories::BaseDirs::new().map(|b| b.home_dir().join(SCOUT_DIR))
    }

    /// Get global config path (~/.scout/config.toml)
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|d| d.join("config.toml"))
    }

    /// Get data directory path with priority:
    /// 1. SCOUT_DATA_DIR env var
    /// 2. `data.dir` from the loaded config
    /// 3. Local .scout/data (walking up from CWD)
    /// 4. Global ~/.scout/data
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir_with(std::env::var(DATA_DIR_ENV).ok())
    }

    fn data_dir_with(&self, env_override: Option<String>) -> PathBuf {
        if let Some(env_path) = env_override.filter(|p| !p.is_empty()) {
            return PathBuf::from(env_path);
        }

        if let Some(dir) = &self.data.dir {
            if dir.is_absolute() {
                return dir.clone();
            }
            let base = self
                .origin
                .as_deref()
                .and_then(Path::parent)
                .unwrap_or_else(|| Path::new("."));
            return base.join(dir);
        }

        if let Some(local) = Self::find_local_dir() {
            return local.join("data");
        }

        if let Some(global) = Self::global_dir() {
            return global.join("data");
        }

        PathBuf::from(SCOUT_DIR).join("data")
    }
}
