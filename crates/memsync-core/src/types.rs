//! Wire types shared by the remote client, the sync reconciler and the tools.
//!
//! All request and response bodies are JSON with camelCase field names.

use serde::{Deserialize, Serialize};
use std::fmt;

// ─────────────────────────────────────────────────────────────────────────────
// Memory Entries
// ─────────────────────────────────────────────────────────────────────────────

/// Entry types accepted when logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogType {
    Summary,
    Decision,
    Error,
}

/// Entry types that can come back from reads and searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    UserInput,
    ClaudeReply,
    Summary,
    Decision,
    Error,
    #[serde(other)]
    Other,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserInput => "user_input",
            Self::ClaudeReply => "claude_reply",
            Self::Summary => "summary",
            Self::Decision => "decision",
            Self::Error => "error",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<LogType> for EntryType {
    fn from(t: LogType) -> Self {
        match t {
            LogType::Summary => Self::Summary,
            LogType::Decision => Self::Decision,
            LogType::Error => Self::Error,
        }
    }
}

/// Input for `POST /logs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLogEntry {
    pub project: String,
    #[serde(rename = "type")]
    pub entry_type: LogType,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub session_id: String,
    pub machine_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_commit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
}

/// Response of `POST /logs`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendLogResponse {
    #[serde(default)]
    pub id: Option<String>,
}

/// A logged entry as returned by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub machine_id: Option<String>,
    #[serde(default)]
    pub machine_name: Option<String>,
    #[serde(default)]
    pub git_branch: Option<String>,
    #[serde(default)]
    pub git_commit: Option<String>,
    #[serde(default)]
    pub directory: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Response of `GET /logs/recent` and `GET /logs/search`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogList {
    #[serde(default, alias = "results", alias = "entries")]
    pub logs: Vec<LogEntry>,
}

/// Parameters for `GET /logs/search`.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub query: String,
    pub project: Option<String>,
    pub entry_type: Option<EntryType>,
    pub limit: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Sessions
// ─────────────────────────────────────────────────────────────────────────────

/// A working session aggregated by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    #[serde(default)]
    pub machine_name: Option<String>,
    #[serde(default)]
    pub machine_id: Option<String>,
    /// Relative to the querying machine
    #[serde(default)]
    pub is_remote: bool,
    #[serde(default)]
    pub git_branch: Option<String>,
    #[serde(default)]
    pub git_commit: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub ended_at: Option<String>,
    #[serde(default)]
    pub log_count: u64,
    #[serde(default)]
    pub directory: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

/// Response of `GET /logs/sessions`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionList {
    #[serde(default)]
    pub sessions: Vec<SessionSummary>,
}

impl SessionList {
    /// True iff any session ran on another machine.
    pub fn has_remote_activity(&self) -> bool {
        self.sessions.iter().any(|s| s.is_remote)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Files
// ─────────────────────────────────────────────────────────────────────────────

/// Input for `POST /files/store`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreFileRequest {
    pub project: String,
    pub file_path: String,
    pub content: String,
    pub content_hash: String,
    pub machine_id: String,
    pub session_id: String,
}

/// Response of `POST /files/store`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreFileResponse {
    #[serde(default)]
    pub deduplicated: bool,
}

/// Latest stored version of a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    pub content: String,
    pub content_hash: String,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub machine_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Entry in the shared-file catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedFile {
    pub file_path: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Response of `GET /files/shared`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SharedFileList {
    #[serde(default)]
    pub files: Vec<SharedFile>,
}

/// Input for `POST /files/share` and `POST /files/unshare`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    pub project: String,
    pub file_path: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Sync Status
// ─────────────────────────────────────────────────────────────────────────────

/// Local hash submitted for comparison. Empty hash means absent locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileHash {
    pub file_path: String,
    pub content_hash: String,
}

/// Input for `POST /files/sync`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncStatusRequest {
    pub project: String,
    pub files: Vec<FileHash>,
}

/// Server verdict for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    UpToDate,
    DownloadNeeded,
    UploadNeeded,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileVerdict {
    pub file_path: String,
    pub status: SyncStatus,
}

/// Response of `POST /files/sync`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncStatusResponse {
    #[serde(default)]
    pub files: Vec<FileVerdict>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_log_entry_wire_shape() {
        let entry = NewLogEntry {
            project: "widgets".into(),
            entry_type: LogType::Decision,
            content: "Use SQLite".into(),
            tags: vec![],
            session_id: "s1".into(),
            machine_id: "m1".into(),
            git_branch: Some("main".into()),
            git_commit: None,
            directory: None,
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            value,
            json!({
                "project": "widgets",
                "type": "decision",
                "content": "Use SQLite",
                "sessionId": "s1",
                "machineId": "m1",
                "gitBranch": "main"
            })
        );
    }

    #[test]
    fn test_unknown_entry_type_and_status() {
        let entry: LogEntry =
            serde_json::from_value(json!({"type": "tool_call", "content": "x"})).unwrap();
        assert_eq!(entry.entry_type, EntryType::Other);

        let verdict: FileVerdict =
            serde_json::from_value(json!({"filePath": "a", "status": "conflict"})).unwrap();
        assert_eq!(verdict.status, SyncStatus::Unknown);
    }

    #[test]
    fn test_has_remote_activity() {
        let list: SessionList = serde_json::from_value(json!({
            "sessions": [
                {"sessionId": "a", "isRemote": false},
                {"sessionId": "b"}
            ]
        }))
        .unwrap();
        assert!(!list.has_remote_activity());

        let list: SessionList = serde_json::from_value(json!({
            "sessions": [{"sessionId": "a"}, {"sessionId": "b", "isRemote": true}]
        }))
        .unwrap();
        assert!(list.has_remote_activity());
    }

    #[test]
    fn test_log_list_accepts_results_key() {
        let list: LogList = serde_json::from_value(json!({
            "results": [{"type": "summary", "content": "done"}]
        }))
        .unwrap();
        assert_eq!(list.logs.len(), 1);
        assert_eq!(list.logs[0].entry_type, EntryType::Summary);
    }
}
