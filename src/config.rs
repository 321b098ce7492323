use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::log::LogLevel;
use crate::{glog_debug, Error, Result};

pub const DEFAULT_LICENSE_CHECK_SECS: u64 = 30;
pub const DEFAULT_LABEL_WIDTH: usize = 18;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub data_file: Option<String>,
    pub license_file: Option<String>,
    pub license_check_secs: Option<u64>,
    pub label_width: Option<usize>,
    pub log_level: Option<LogLevel>,
}

impl Config {
    /// Data directory: `$GROVE_HOME` when set, otherwise `~/.grove`.
    pub fn grove_dir() -> Result<PathBuf> {
        if let Ok(dir) = std::env::var("GROVE_HOME") {
            if !dir.trim().is_empty() {
                return Ok(expand_tilde(&dir));
            }
        }
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".grove"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::grove_dir()?.join("grove.toml"))
    }

    pub fn data_path(&self) -> Result<PathBuf> {
        match &self.data_file {
            Some(file) => Ok(expand_tilde(file)),
            None => Ok(Self::grove_dir()?.join("tasks.json")),
        }
    }

    pub fn license_path(&self) -> Result<PathBuf> {
        match &self.license_file {
            Some(file) => Ok(expand_tilde(file)),
            None => Ok(Self::grove_dir()?.join("LICENSE")),
        }
    }

    pub fn license_interval(&self) -> Duration {
        Duration::from_secs(
            self.license_check_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_LICENSE_CHECK_SECS),
        )
    }

    pub fn effective_label_width(&self) -> usize {
        self.label_width
            .filter(|w| *w > 2)
            .unwrap_or(DEFAULT_LABEL_WIDTH)
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        glog_debug!("Config::load path={}", path.display());
        if !path.exists() {
            glog_debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        let config: Self = toml::from_str(&fs::read_to_string(path)?)?;
        glog_debug!(
            "Config loaded: data_file={:?}, license_file={:?}, label_width={:?}",
            config.data_file,
            config.license_file,
            config.label_width
        );
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                glog_debug!("Creating config directory: {}", dir.display());
                fs::create_dir_all(dir)?;
            }
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        glog_debug!("Config saved to {}", path.display());
        Ok(())
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
