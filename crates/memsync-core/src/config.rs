//! Configuration management for memsync.
//!
//! Configuration is loaded from multiple sources with precedence:
//! 1. Environment variables (MEMSYNC_*)
//! 2. Config file (~/.memsync/config.toml)
//! 3. Default values
//!
//! Standard directory structure:
//! ```text
//! ~/.memsync/
//! ├── config.toml        # Optional settings
//! ├── credentials.json   # {serverUrl, token}, mode 0600
//! └── machine.json       # {machineId, alias}, mode 0600
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Local state locations (derived, not read from the file)
    #[serde(skip)]
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Timeout for metadata requests in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Timeout for file transfer requests in seconds
    #[serde(default = "default_transfer_timeout")]
    pub transfer_timeout_secs: u64,
}

#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Base directory for local state
    pub home_dir: PathBuf,
    /// Config file that was (or would be) loaded
    pub config_file: PathBuf,
}

fn default_timeout() -> u64 {
    10
}

fn default_transfer_timeout() -> u64 {
    30
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            transfer_timeout_secs: default_transfer_timeout(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_secs(self.transfer_timeout_secs)
    }
}

impl PathsConfig {
    /// Paths rooted at a given home directory.
    pub fn at(home_dir: impl Into<PathBuf>) -> Self {
        let home_dir = home_dir.into();
        Self {
            config_file: home_dir.join("config.toml"),
            home_dir,
        }
    }

    pub fn credentials_file(&self) -> PathBuf {
        self.home_dir.join("credentials.json")
    }

    pub fn machine_file(&self) -> PathBuf {
        self.home_dir.join("machine.json")
    }
}

impl Config {
    /// Load configuration from file and environment.
    pub fn load() -> Result<Self> {
        let home_dir = Self::home_dir()?;
        let config_file = std::env::var("MEMSYNC_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home_dir.join("config.toml"));

        let mut config = Self::from_file(&config_file)?;
        config.paths = PathsConfig {
            home_dir,
            config_file,
        };
        Ok(config)
    }

    /// Load configuration rooted at an explicit home directory.
    pub fn load_from(home_dir: &Path) -> Result<Self> {
        let paths = PathsConfig::at(home_dir);
        let mut config = Self::from_file(&paths.config_file)?;
        config.paths = paths;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Ok(toml::from_str(&content)?)
    }

    /// Base directory for local state (`$MEMSYNC_HOME` or `~/.memsync`).
    pub fn home_dir() -> Result<PathBuf> {
        if let Ok(dir) = std::env::var("MEMSYNC_HOME") {
            return Ok(PathBuf::from(dir));
        }
        dirs::home_dir()
            .map(|home| home.join(".memsync"))
            .ok_or(Error::NoHomeDir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.http.timeout_secs, 10);
        assert_eq!(config.http.transfer_timeout_secs, 30);
        assert_eq!(config.http.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let temp = tempdir().expect("Failed to create temp dir");
        let config = Config::load_from(temp.path()).expect("Failed to load config");

        assert_eq!(config.http.transfer_timeout_secs, 30);
        assert_eq!(config.paths.home_dir, temp.path());
        assert!(config.paths.credentials_file().ends_with("credentials.json"));
        assert!(config.paths.machine_file().ends_with("machine.json"));
    }

    #[test]
    fn test_load_partial_file() {
        let temp = tempdir().expect("Failed to create temp dir");
        std::fs::write(temp.path().join("config.toml"), "[http]\ntimeout_secs = 5\n").unwrap();

        let config = Config::load_from(temp.path()).expect("Failed to load config");
        assert_eq!(config.http.timeout_secs, 5);
        assert_eq!(config.http.transfer_timeout_secs, 30);
    }

    #[test]
    fn test_load_invalid_file() {
        let temp = tempdir().expect("Failed to create temp dir");
        std::fs::write(temp.path().join("config.toml"), "[http\n").unwrap();

        assert!(matches!(Config::load_from(temp.path()), Err(Error::Config(_))));
    }
}
