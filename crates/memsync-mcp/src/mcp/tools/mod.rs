//! MCP tool implementations.
//!
//! Tools are organized by domain:
//! - logs: Memory entries, sessions and search
//! - files: Storing, fetching and sharing files
//! - sync: Shared-file reconciliation
//! - status: Agent and connection status
//!
//! Every tool checks its preconditions in the same order (connection first,
//! then project) and answers with plain text. Failures are text too, returned
//! through the `Err` side of [`ToolOutput`].

mod files;
mod format;
mod logs;
mod status;
mod sync;

use memsync_core::client::{Connection, Connector, MemoryApi, Timeout};
use memsync_core::AgentContext;
use std::sync::Arc;
use tracing::debug;

/// Reply for a missing or empty credentials file.
pub const NOT_AUTHENTICATED: &str = "Not authenticated. Run `memsync login --server <url>` to connect this machine to a memory server.";

/// Reply when no project key can be derived.
pub const PROJECT_UNRESOLVED: &str = "Could not determine the project for this directory. Pass `project` explicitly (a project name or git remote URL).";

/// Text result of a tool, success or failure.
pub type ToolOutput = std::result::Result<String, String>;

/// Tool logic, independent of the MCP transport.
#[derive(Clone)]
pub struct MemoryTools {
    ctx: Arc<AgentContext>,
    connector: Arc<dyn Connector>,
}

impl MemoryTools {
    pub fn new(ctx: Arc<AgentContext>, connector: Arc<dyn Connector>) -> Self {
        Self { ctx, connector }
    }

    pub fn context(&self) -> &AgentContext {
        &self.ctx
    }

    fn connect(&self, timeout: Timeout) -> Result<Arc<dyn MemoryApi>, String> {
        match self.connector.connect(timeout) {
            Ok(Connection::Authenticated(api)) => Ok(api),
            Ok(Connection::Unauthenticated) => Err(NOT_AUTHENTICATED.to_string()),
            Err(e) => Err(e.user_message()),
        }
    }

    fn project(&self, explicit: Option<&str>) -> Result<String, String> {
        let resolved = self
            .ctx
            .resolve_project(explicit)
            .ok_or_else(|| PROJECT_UNRESOLVED.to_string())?;
        debug!("Project {:?} ({:?})", resolved.key, resolved.source);
        Ok(resolved.key)
    }

    /// Connection and project, in that order.
    fn prepare(
        &self,
        timeout: Timeout,
        explicit: Option<&str>,
    ) -> Result<(Arc<dyn MemoryApi>, String), String> {
        let api = self.connect(timeout)?;
        let project = self.project(explicit)?;
        Ok((api, project))
    }

    fn relative_path(&self, file_path: &str) -> Result<String, String> {
        self.ctx.relative_path(file_path).map_err(|e| e.user_message())
    }
}
