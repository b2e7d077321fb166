//! Configuration paths and settings for Simform
//!
//! Everything lives under one home directory:
//! - `config.toml` with default schema/model locations
//! - `logs/` for the daily rolling log file

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = "config.toml";

/// Resolve the Simform home directory.
///
/// Priority:
/// 1) SIMFORM_HOME
/// 2) HOME/USERPROFILE
/// 3) ./.simform
pub fn simform_home() -> PathBuf {
    if let Ok(override_path) = std::env::var("SIMFORM_HOME") {
        return PathBuf::from(override_path);
    }
    if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
        return PathBuf::from(home).join(".simform");
    }
    PathBuf::from(".").join(".simform")
}

/// Logs directory: <home>/logs
pub fn logs_dir() -> PathBuf {
    simform_home().join("logs")
}

/// Config file: <home>/config.toml
pub fn config_path() -> PathBuf {
    simform_home().join(CONFIG_FILE)
}

/// Settings read from `config.toml`. Command-line flags win over these.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimformConfig {
    /// Schema document used when `--schema` is not given.
    pub schema: Option<PathBuf>,
    /// Model data file used when `--models` is not given.
    pub models: Option<PathBuf>,
    /// Simulated fetch latency for the stub loader.
    pub load_delay_ms: u64,
}

impl SimformConfig {
    /// Read `<home>/config.toml`. A missing file means defaults.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::from_path(&path)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        // Relative paths in the file are relative to the file, not the cwd.
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(Self {
            schema: config.schema.map(|p| anchor(base, p)),
            models: config.models.map(|p| anchor(base, p)),
            ..config
        })
    }

    pub fn load_delay(&self) -> Duration {
        Duration::from_millis(self.load_delay_ms)
    }
}

fn anchor(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
