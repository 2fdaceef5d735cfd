//! Credential storage.
//!
//! Credentials are written once by `memsync login` and read by every
//! authenticated operation. A missing credentials file is a normal state
//! ("not authenticated"), never an error.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Server location and bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub server_url: String,
    pub token: String,
}

impl Credentials {
    pub fn new(server_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into().trim().trim_end_matches('/').to_string(),
            token: token.into().trim().to_string(),
        }
    }

    /// Base URL for API requests (`<serverUrl>/api`).
    pub fn api_base(&self) -> String {
        format!("{}/api", self.server_url.trim_end_matches('/'))
    }

    /// Token prefix safe for display.
    pub fn token_hint(&self) -> String {
        let prefix: String = self.token.chars().take(8).collect();
        format!("{}...", prefix)
    }
}

/// Reads and writes `credentials.json`.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load credentials.
    ///
    /// `MEMSYNC_SERVER_URL` and `MEMSYNC_TOKEN` together take precedence over the file.
    pub fn load(&self) -> Result<Option<Credentials>> {
        if let (Ok(url), Ok(token)) = (
            std::env::var("MEMSYNC_SERVER_URL"),
            std::env::var("MEMSYNC_TOKEN"),
        ) {
            if !url.trim().is_empty() && !token.trim().is_empty() {
                debug!("Using credentials from environment");
                return Ok(Some(Credentials::new(url, token)));
            }
        }
        self.load_file()
    }

    /// Load credentials from the file only.
    pub fn load_file(&self) -> Result<Option<Credentials>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let creds: Credentials = serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!("Invalid credentials file {}: {}", self.path.display(), e))
        })?;

        if creds.server_url.is_empty() || creds.token.is_empty() {
            warn!("Credentials file {:?} is missing serverUrl or token", self.path);
            return Ok(None);
        }
        Ok(Some(creds))
    }

    /// Persist credentials with owner-only permissions.
    pub fn save(&self, creds: &Credentials) -> Result<()> {
        let json = serde_json::to_string_pretty(creds)?;
        write_private(&self.path, json.as_bytes())
    }

    /// Remove stored credentials. Returns whether a file was removed.
    pub fn clear(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Write a file readable only by its owner (0600), creating parent directories.
pub(crate) fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;

    // mode() only applies on creation; tighten a file that already existed
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents)?;
    Ok(())
}
