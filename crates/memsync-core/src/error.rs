//! Error types for memsync-core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using memsync-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for memsync operations
#[derive(Error, Debug)]
pub enum Error {
    // Codec errors
    #[error("File {path} is {size} bytes, exceeding the {limit} byte transfer limit")]
    SizeLimitExceeded { path: String, size: u64, limit: u64 },

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid file path: {0} (paths must stay inside the working directory)")]
    InvalidPath(String),

    #[error("Invalid file content: {0}")]
    InvalidContent(String),

    // Remote errors
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Server error ({status}): {message}")]
    Remote { status: u16, message: String },

    // Local state errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No home directory found. Set MEMSYNC_HOME.")]
    NoHomeDir,

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a size limit error for a file path
    pub fn size_limit(path: impl Into<PathBuf>, size: u64, limit: u64) -> Self {
        Self::SizeLimitExceeded {
            path: path.into().display().to_string(),
            size,
            limit,
        }
    }

    /// Create an error from a non-2xx server response
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }

    /// Message suitable for showing to the assistant.
    ///
    /// Remote errors carry the server's own wording, so the status prefix is dropped.
    pub fn user_message(&self) -> String {
        match self {
            Self::Remote { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

#[cfg(feature = "client")]
impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Transport(e.to_string())
    }
}
