//! Remote memory gateway.
//!
//! [`MemoryApi`] is the typed surface of the memory server: logs, sessions,
//! search and file storage. [`RemoteClient`] implements it over HTTP with
//! bearer authentication; there are no retries, every call is one attempt.
//!
//! Whether a client exists at all is expressed by [`Connection`], so callers
//! must handle the unauthenticated case explicitly.
//!
//! # Usage
//!
//! ```rust,no_run
//! use memsync_core::client::{Connection, Connector, CredentialConnector, MemoryApi, Timeout};
//! use memsync_core::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let connector = CredentialConnector::from_config(&config);
//!     match connector.connect(Timeout::Metadata)? {
//!         Connection::Authenticated(api) => {
//!             let recent = api.recent_logs("widgets", 10).await?;
//!             println!("{} entries", recent.len());
//!         }
//!         Connection::Unauthenticated => println!("run `memsync login` first"),
//!     }
//!     Ok(())
//! }
//! ```

use crate::error::Result;
use crate::types::*;
use async_trait::async_trait;
use std::sync::Arc;

#[cfg(feature = "client")]
mod http;
#[cfg(any(test, feature = "test-util"))]
mod memory;

#[cfg(feature = "client")]
pub use http::{extract_error_message, CredentialConnector, RemoteClient};
#[cfg(any(test, feature = "test-util"))]
pub use memory::{InMemoryRemote, StaticConnector};

/// Operations exposed by the memory server.
#[async_trait]
pub trait MemoryApi: Send + Sync {
    /// Append an entry to the project log.
    async fn append_log(&self, entry: &NewLogEntry) -> Result<AppendLogResponse>;

    /// Most recent entries for a project, newest first.
    async fn recent_logs(&self, project: &str, limit: u32) -> Result<Vec<LogEntry>>;

    /// Sessions for a project, with `isRemote` relative to `machine_id`.
    async fn sessions(&self, project: &str, machine_id: &str, limit: u32) -> Result<SessionList>;

    /// Full-text search over entries.
    async fn search_logs(&self, query: &SearchQuery) -> Result<Vec<LogEntry>>;

    /// Store a new version of a file.
    async fn store_file(&self, request: &StoreFileRequest) -> Result<StoreFileResponse>;

    /// Latest stored version of a file, if any.
    async fn latest_file(&self, project: &str, file_path: &str) -> Result<Option<RemoteFile>>;

    /// Mark a file as shared across machines.
    async fn share_file(&self, project: &str, file_path: &str) -> Result<()>;

    /// Remove a file from the shared catalog.
    async fn unshare_file(&self, project: &str, file_path: &str) -> Result<()>;

    /// The shared-file catalog for a project.
    async fn shared_files(&self, project: &str) -> Result<Vec<SharedFile>>;

    /// Compare local hashes with the latest stored versions.
    async fn sync_status(&self, project: &str, files: &[FileHash]) -> Result<Vec<FileVerdict>>;
}

/// Request timeout class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// Log, session, search and catalog requests
    Metadata,
    /// File uploads and downloads
    Transfer,
}

/// Result of looking for stored credentials.
#[derive(Clone)]
pub enum Connection {
    Unauthenticated,
    Authenticated(Arc<dyn MemoryApi>),
}

impl Connection {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// Builds a [`Connection`] on demand.
///
/// Consulted on every tool invocation, so credentials written while the
/// server is running are picked up.
pub trait Connector: Send + Sync {
    fn connect(&self, timeout: Timeout) -> Result<Connection>;

    /// Server URL for display, when known.
    fn server_url(&self) -> Option<String> {
        None
    }
}
