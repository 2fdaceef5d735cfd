//! memsync-core - Core library for memsync
//!
//! Shared by the `memsync` CLI and the `memsync-mcp` tool server:
//!
//! - **codec**: Size-bounded file encoding, binary detection, MD5 fingerprints
//! - **machine**: Persistent machine identity
//! - **project**: Project key resolution
//! - **git**: Repository context (branch, commit, origin)
//! - **client**: Remote memory gateway (logs, sessions, search, files)
//! - **sync**: Shared-file reconciliation
//! - **auth**: Stored credentials
//! - **context**: Per-process agent context

pub mod auth;
pub mod client;
pub mod codec;
pub mod config;
pub mod context;
pub mod error;
pub mod git;
pub mod machine;
pub mod project;
pub mod sync;
pub mod types;

// Re-export commonly used types
pub use auth::{CredentialStore, Credentials};
pub use client::{Connection, Connector, MemoryApi, Timeout};
pub use config::Config;
pub use context::AgentContext;
pub use error::{Error, Result};
pub use machine::{MachineIdentity, MachineStore};
pub use project::{ProjectSource, ResolvedProject};
pub use sync::{FileSyncer, SyncOutcome, SyncReport};
