//! Path resolution and optional settings file.
//!
//! Settings are read-only: a missing `livegrade.json` means defaults, a
//! malformed one is reported and ignored.

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::debounce::DEFAULT_DEBOUNCE_MS;

pub const SETTINGS_FILE: &str = "livegrade.json";
pub const LOG_FILE: &str = "livegrade.log";
pub const CONFIG_DIR_ENV: &str = "LIVEGRADE_CONFIG_DIR";

/// Configuration for overriding default application paths
#[derive(Debug, Clone, Default)]
pub struct PathConfig {
    /// Custom config directory (from CLI or ENV)
    pub config_dir: Option<PathBuf>,
}

impl PathConfig {
    /// Priority: CLI args → ENV var (LIVEGRADE_CONFIG_DIR) → None (use defaults)
    pub fn from_env_and_cli(cli_dir: Option<PathBuf>) -> Self {
        let config_dir = cli_dir.or_else(|| std::env::var_os(CONFIG_DIR_ENV).map(PathBuf::from));
        Self { config_dir }
    }
}

/// Get path to a configuration file
///
/// Platform paths:
/// - Linux: ~/.config/livegrade/{name}
/// - macOS: ~/Library/Application Support/livegrade/{name}
/// - Windows: %APPDATA%\livegrade\{name}
pub fn config_file(name: &str, config: &PathConfig) -> PathBuf {
    get_config_dir(config).join(name)
}

/// Get path to a data file (logs)
pub fn data_file(name: &str, config: &PathConfig) -> PathBuf {
    get_data_dir(config).join(name)
}

/// Create the parent directory of `path` if missing.
pub fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.exists() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
    }
    Ok(())
}

fn get_config_dir(config: &PathConfig) -> PathBuf {
    if let Some(dir) = &config.config_dir {
        return dir.clone();
    }
    if let Some(dir) = dirs_next::config_dir() {
        return dir.join("livegrade");
    }
    PathBuf::from(".")
}

fn get_data_dir(config: &PathConfig) -> PathBuf {
    if let Some(dir) = &config.config_dir {
        return dir.clone();
    }
    if let Some(dir) = dirs_next::data_dir() {
        return dir.join("livegrade");
    }
    PathBuf::from(".")
}

/// Engine settings from `livegrade.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Render tool executable (name on PATH or absolute path)
    pub tool: String,
    pub debounce_ms: u64,
    pub render_workers: usize,
    /// mjpeg quality for raw frame capture (2 = best, 31 = worst)
    pub capture_quality: u8,
    /// Parent for the per-session cache directory (system temp dir if unset)
    pub cache_parent: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tool: "ffmpeg".to_string(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            render_workers: (num_cpus::get() / 2).max(2),
            capture_quality: 4,
            cache_parent: None,
        }
    }
}

impl Settings {
    /// Load from the config directory, falling back to defaults.
    pub fn load(config: &PathConfig) -> Self {
        Self::load_from(&config_file(SETTINGS_FILE, config))
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(settings) => {
                    debug!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    warn!("Ignoring malformed settings file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings file at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                warn!("Failed to read settings file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}
