//! MCP Server implementation.
//!
//! Tools are declared with `#[tool_router]`; each one delegates to
//! [`MemoryTools`] and turns its text output into a tool result. Tool-level
//! failures are `isError` results, never protocol errors.

use rmcp::{
    handler::server::{router::tool::ToolRouter, tool::ToolCallContext, wrapper::Parameters},
    model::{
        CallToolRequestParam, CallToolResult, Content, ListToolsResult,
        PaginatedRequestParam, ServerCapabilities, ServerInfo,
    },
    schemars::{self, JsonSchema},
    tool, tool_router, ErrorData, RoleServer, ServerHandler,
};
use memsync_core::types::{EntryType, LogType};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::tools::{MemoryTools, ToolOutput};

/// memsync MCP Server
///
/// Provides memory and file-sync tools for AI assistant integration.
#[derive(Clone)]
pub struct McpServer {
    tools: MemoryTools,
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    pub fn new(tools: MemoryTools) -> Self {
        Self {
            tools,
            tool_router: Self::tool_router(),
        }
    }
}

fn into_result(output: ToolOutput) -> Result<CallToolResult, ErrorData> {
    Ok(match output {
        Ok(text) => CallToolResult::success(vec![Content::text(text)]),
        Err(text) => CallToolResult::error(vec![Content::text(text)]),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Parameters
// ─────────────────────────────────────────────────────────────────────────────

/// Entry type accepted by memory_log
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Summary,
    Decision,
    Error,
}

impl LogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Decision => "decision",
            Self::Error => "error",
        }
    }
}

impl From<LogKind> for LogType {
    fn from(kind: LogKind) -> Self {
        match kind {
            LogKind::Summary => Self::Summary,
            LogKind::Decision => Self::Decision,
            LogKind::Error => Self::Error,
        }
    }
}

/// Entry type filter for memory_search
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    UserInput,
    ClaudeReply,
    Summary,
    Decision,
    Error,
}

impl From<EntryKind> for EntryType {
    fn from(kind: EntryKind) -> Self {
        match kind {
            EntryKind::UserInput => Self::UserInput,
            EntryKind::ClaudeReply => Self::ClaudeReply,
            EntryKind::Summary => Self::Summary,
            EntryKind::Decision => Self::Decision,
            EntryKind::Error => Self::Error,
        }
    }
}

/// Parameters for memory_log tool
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct LogParams {
    /// Project name or git remote URL (defaults to the current repository)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Kind of entry
    #[serde(rename = "type")]
    pub kind: LogKind,
    /// What to remember
    pub content: String,
    /// Optional tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Session to attach the entry to (defaults to this server's session)
    #[serde(rename = "sessionId", default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Parameters for memory_recent and memory_sessions tools
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListParams {
    /// Project name or git remote URL (defaults to the current repository)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Maximum number of results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Parameters for memory_search tool
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchParams {
    /// Text to search for
    pub query: String,
    /// Project name or git remote URL (defaults to the current repository)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Only return entries of this type
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<EntryKind>,
    /// Maximum number of results (default 20)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Parameters for tools that act on one file
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct FileParams {
    /// Project name or git remote URL (defaults to the current repository)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Path relative to the working directory
    #[serde(rename = "filePath")]
    pub file_path: String,
}

/// Parameters for memory_get_file tool
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetFileParams {
    /// Project name or git remote URL (defaults to the current repository)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Path relative to the working directory
    #[serde(rename = "filePath")]
    pub file_path: String,
    /// Write the stored version to disk instead of returning it
    #[serde(default)]
    pub write: bool,
}

/// Parameters for project-wide tools
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct ProjectParams {
    /// Project name or git remote URL (defaults to the current repository)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tools
// ─────────────────────────────────────────────────────────────────────────────

#[tool_router]
impl McpServer {
    #[tool(description = "Record a memory entry (summary, decision or error) for the project so later sessions and other machines can recall it.")]
    async fn memory_log(
        &self,
        Parameters(params): Parameters<LogParams>,
    ) -> Result<CallToolResult, ErrorData> {
        into_result(self.tools.log(params).await)
    }

    #[tool(description = "Show the most recent memory entries for the project, newest first. Default limit 20.")]
    async fn memory_recent(
        &self,
        Parameters(params): Parameters<ListParams>,
    ) -> Result<CallToolResult, ErrorData> {
        into_result(self.tools.recent(params).await)
    }

    #[tool(description = "List recent working sessions for the project, marking sessions from other machines. Default limit 10.")]
    async fn memory_sessions(
        &self,
        Parameters(params): Parameters<ListParams>,
    ) -> Result<CallToolResult, ErrorData> {
        into_result(self.tools.sessions(params).await)
    }

    #[tool(description = "Search memory entries by text, optionally filtered by entry type.")]
    async fn memory_search(
        &self,
        Parameters(params): Parameters<SearchParams>,
    ) -> Result<CallToolResult, ErrorData> {
        into_result(self.tools.search(params).await)
    }

    #[tool(description = "Upload the current version of a file (max 1 MiB). Unchanged content is deduplicated by the server.")]
    async fn memory_store_file(
        &self,
        Parameters(params): Parameters<FileParams>,
    ) -> Result<CallToolResult, ErrorData> {
        into_result(self.tools.store_file(params).await)
    }

    #[tool(description = "Fetch the latest stored version of a file. Set write=true to save it to disk.")]
    async fn memory_get_file(
        &self,
        Parameters(params): Parameters<GetFileParams>,
    ) -> Result<CallToolResult, ErrorData> {
        into_result(self.tools.get_file(params).await)
    }

    #[tool(description = "Mark a file as shared so every machine keeps it in sync via memory_sync_files.")]
    async fn memory_share_file(
        &self,
        Parameters(params): Parameters<FileParams>,
    ) -> Result<CallToolResult, ErrorData> {
        into_result(self.tools.share_file(params).await)
    }

    #[tool(description = "Stop syncing a shared file. Stored versions are kept.")]
    async fn memory_unshare_file(
        &self,
        Parameters(params): Parameters<FileParams>,
    ) -> Result<CallToolResult, ErrorData> {
        into_result(self.tools.unshare_file(params).await)
    }

    #[tool(description = "List the files shared for the project and whether each exists locally.")]
    async fn memory_shared_files(
        &self,
        Parameters(params): Parameters<ProjectParams>,
    ) -> Result<CallToolResult, ErrorData> {
        into_result(self.tools.shared_files(params).await)
    }

    #[tool(description = "Synchronize shared files: download newer or missing files, upload local changes.")]
    async fn memory_sync_files(
        &self,
        Parameters(params): Parameters<ProjectParams>,
    ) -> Result<CallToolResult, ErrorData> {
        into_result(self.tools.sync_files(params).await)
    }

    #[tool(description = "Show connection, machine, session, project and git status. Works without authentication.")]
    async fn memory_status(&self) -> Result<CallToolResult, ErrorData> {
        into_result(Ok(self.tools.status()))
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "memsync - persistent project memory and cross-machine file sync. Log decisions and summaries with memory_log, recall them with memory_recent or memory_search, and keep shared files in sync with memory_sync_files."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, ErrorData>> + Send + '_ {
        async move {
            let tools = self.tool_router.list_all();
            debug!("list_tools: returning {} tools", tools.len());
            Ok(ListToolsResult {
                tools,
                next_cursor: None,
            })
        }
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: rmcp::service::RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, ErrorData>> + Send + '_ {
        debug!("Calling tool: {}", request.name);
        async move {
            let tool_context = ToolCallContext::new(self, request, context);
            self.tool_router.call(tool_context).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_all_tools_registered() {
        let router = McpServer::tool_router();
        let mut names: Vec<String> = router
            .list_all()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "memory_get_file",
                "memory_log",
                "memory_recent",
                "memory_search",
                "memory_sessions",
                "memory_share_file",
                "memory_shared_files",
                "memory_status",
                "memory_store_file",
                "memory_sync_files",
                "memory_unshare_file",
            ]
        );
    }

    #[test]
    fn test_log_params_wire_names() {
        let params: LogParams = serde_json::from_value(json!({
            "type": "decision",
            "content": "Use SQLite",
            "sessionId": "s-9",
            "tags": ["storage"]
        }))
        .unwrap();
        assert!(matches!(params.kind, LogKind::Decision));
        assert_eq!(params.session_id.as_deref(), Some("s-9"));
        assert!(params.project.is_none());

        let bad = serde_json::from_value::<LogParams>(json!({"type": "user_input", "content": "x"}));
        assert!(bad.is_err());
    }

    #[test]
    fn test_get_file_defaults_to_read_only() {
        let params: GetFileParams = serde_json::from_value(json!({"filePath": "a.txt"})).unwrap();
        assert!(!params.write);
    }
}
