//! In-memory memory server for tests.

use super::{Connection, Connector, MemoryApi, Timeout};
use crate::error::{Error, Result};
use crate::types::*;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct State {
    logs: Vec<(String, LogEntry)>,
    /// (project, path) -> latest version
    files: HashMap<(String, String), RemoteFile>,
    shared: BTreeMap<String, BTreeSet<String>>,
    verdicts: HashMap<String, SyncStatus>,
    failing: HashMap<String, String>,
    store_calls: Vec<StoreFileRequest>,
    latest_calls: Vec<String>,
}

/// [`MemoryApi`] backed by process memory.
///
/// Verdicts follow the server's rule: equal hashes are up to date, an empty local
/// hash with a stored version needs a download, anything else needs an upload.
/// [`InMemoryRemote::override_verdict`] forces a verdict to mimic stale server state.
#[derive(Clone, Default)]
pub struct InMemoryRemote {
    state: Arc<Mutex<State>>,
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking test poisons the lock; the data is still usable
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed a stored file version.
    pub fn put_file(&self, project: &str, file_path: &str, content: &str, content_hash: &str) {
        self.lock().files.insert(
            (project.to_string(), file_path.to_string()),
            RemoteFile {
                content: content.to_string(),
                content_hash: content_hash.to_string(),
                file_path: Some(file_path.to_string()),
                machine_id: None,
                created_at: None,
            },
        );
    }

    /// Add a path to the shared catalog without storing content.
    pub fn share(&self, project: &str, file_path: &str) {
        self.lock()
            .shared
            .entry(project.to_string())
            .or_default()
            .insert(file_path.to_string());
    }

    pub fn override_verdict(&self, file_path: &str, status: SyncStatus) {
        self.lock().verdicts.insert(file_path.to_string(), status);
    }

    /// Make every transfer for `file_path` fail with `message`.
    pub fn fail_transfers(&self, file_path: &str, message: &str) {
        self.lock()
            .failing
            .insert(file_path.to_string(), message.to_string());
    }

    pub fn file(&self, project: &str, file_path: &str) -> Option<RemoteFile> {
        self.lock()
            .files
            .get(&(project.to_string(), file_path.to_string()))
            .cloned()
    }

    pub fn store_calls(&self) -> Vec<StoreFileRequest> {
        self.lock().store_calls.clone()
    }

    /// Paths requested through `latest_file`, in call order.
    pub fn download_calls(&self) -> Vec<String> {
        self.lock().latest_calls.clone()
    }

    pub fn logs(&self) -> Vec<LogEntry> {
        self.lock().logs.iter().map(|(_, e)| e.clone()).collect()
    }

    fn check_failing(state: &State, file_path: &str) -> Result<()> {
        match state.failing.get(file_path) {
            Some(message) => Err(Error::remote(500, message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MemoryApi for InMemoryRemote {
    async fn append_log(&self, entry: &NewLogEntry) -> Result<AppendLogResponse> {
        let mut state = self.lock();
        let id = format!("log_{}", state.logs.len() + 1);
        let stored = LogEntry {
            id: Some(id.clone()),
            project: Some(entry.project.clone()),
            entry_type: entry.entry_type.into(),
            content: entry.content.clone(),
            tags: entry.tags.clone(),
            session_id: Some(entry.session_id.clone()),
            machine_id: Some(entry.machine_id.clone()),
            machine_name: None,
            git_branch: entry.git_branch.clone(),
            git_commit: entry.git_commit.clone(),
            directory: entry.directory.clone(),
            created_at: Some(chrono::Utc::now().to_rfc3339()),
        };
        state.logs.push((entry.project.clone(), stored));
        Ok(AppendLogResponse { id: Some(id) })
    }

    async fn recent_logs(&self, project: &str, limit: u32) -> Result<Vec<LogEntry>> {
        Ok(self
            .lock()
            .logs
            .iter()
            .rev()
            .filter(|(p, _)| p == project)
            .take(limit as usize)
            .map(|(_, e)| e.clone())
            .collect())
    }

    async fn sessions(&self, project: &str, machine_id: &str, limit: u32) -> Result<SessionList> {
        let state = self.lock();
        let mut sessions: Vec<SessionSummary> = Vec::new();
        for (_, entry) in state.logs.iter().filter(|(p, _)| p == project) {
            let session_id = entry.session_id.clone().unwrap_or_default();
            match sessions.iter_mut().find(|s| s.session_id == session_id) {
                Some(session) => {
                    session.log_count += 1;
                    session.ended_at = entry.created_at.clone();
                }
                None => sessions.push(SessionSummary {
                    session_id,
                    machine_name: entry.machine_name.clone(),
                    machine_id: entry.machine_id.clone(),
                    is_remote: entry.machine_id.as_deref() != Some(machine_id),
                    git_branch: entry.git_branch.clone(),
                    git_commit: entry.git_commit.clone(),
                    started_at: entry.created_at.clone(),
                    ended_at: entry.created_at.clone(),
                    log_count: 1,
                    directory: entry.directory.clone(),
                    summary: None,
                }),
            }
        }
        sessions.reverse();
        sessions.truncate(limit as usize);
        Ok(SessionList { sessions })
    }

    async fn search_logs(&self, query: &SearchQuery) -> Result<Vec<LogEntry>> {
        let needle = query.query.to_lowercase();
        Ok(self
            .lock()
            .logs
            .iter()
            .rev()
            .filter(|(p, _)| query.project.as_deref().is_none_or(|q| q == p))
            .filter(|(_, e)| query.entry_type.is_none_or(|t| t == e.entry_type))
            .filter(|(_, e)| e.content.to_lowercase().contains(&needle))
            .take(query.limit as usize)
            .map(|(_, e)| e.clone())
            .collect())
    }

    async fn store_file(&self, request: &StoreFileRequest) -> Result<StoreFileResponse> {
        let mut state = self.lock();
        Self::check_failing(&state, &request.file_path)?;
        state.store_calls.push(request.clone());

        let key = (request.project.clone(), request.file_path.clone());
        let deduplicated = state
            .files
            .get(&key)
            .is_some_and(|f| f.content_hash == request.content_hash);
        if !deduplicated {
            state.files.insert(
                key,
                RemoteFile {
                    content: request.content.clone(),
                    content_hash: request.content_hash.clone(),
                    file_path: Some(request.file_path.clone()),
                    machine_id: Some(request.machine_id.clone()),
                    created_at: Some(chrono::Utc::now().to_rfc3339()),
                },
            );
        }
        Ok(StoreFileResponse { deduplicated })
    }

    async fn latest_file(&self, project: &str, file_path: &str) -> Result<Option<RemoteFile>> {
        let mut state = self.lock();
        state.latest_calls.push(file_path.to_string());
        Self::check_failing(&state, file_path)?;
        Ok(state
            .files
            .get(&(project.to_string(), file_path.to_string()))
            .cloned())
    }

    async fn share_file(&self, project: &str, file_path: &str) -> Result<()> {
        self.share(project, file_path);
        Ok(())
    }

    async fn unshare_file(&self, project: &str, file_path: &str) -> Result<()> {
        if let Some(paths) = self.lock().shared.get_mut(project) {
            paths.remove(file_path);
        }
        Ok(())
    }

    async fn shared_files(&self, project: &str) -> Result<Vec<SharedFile>> {
        Ok(self
            .lock()
            .shared
            .get(project)
            .map(|paths| {
                paths
                    .iter()
                    .map(|p| SharedFile {
                        file_path: p.clone(),
                        created_at: None,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn sync_status(&self, project: &str, files: &[FileHash]) -> Result<Vec<FileVerdict>> {
        let state = self.lock();
        Ok(files
            .iter()
            .map(|f| {
                let status = state.verdicts.get(&f.file_path).copied().unwrap_or_else(|| {
                    match state.files.get(&(project.to_string(), f.file_path.clone())) {
                        None => SyncStatus::UploadNeeded,
                        Some(remote) if remote.content_hash == f.content_hash => {
                            SyncStatus::UpToDate
                        }
                        Some(_) if f.content_hash.is_empty() => SyncStatus::DownloadNeeded,
                        Some(_) => SyncStatus::UploadNeeded,
                    }
                });
                FileVerdict {
                    file_path: f.file_path.clone(),
                    status,
                }
            })
            .collect())
    }
}

/// [`Connector`] returning a fixed connection.
///
/// Records the timeout class of every `connect` call.
#[derive(Clone)]
pub struct StaticConnector {
    connection: Connection,
    requested: Arc<Mutex<Vec<Timeout>>>,
}

impl StaticConnector {
    pub fn authenticated(api: Arc<dyn MemoryApi>) -> Self {
        Self {
            connection: Connection::Authenticated(api),
            requested: Arc::default(),
        }
    }

    pub fn unauthenticated() -> Self {
        Self {
            connection: Connection::Unauthenticated,
            requested: Arc::default(),
        }
    }

    /// Timeout classes requested so far, in call order.
    pub fn requested_timeouts(&self) -> Vec<Timeout> {
        self.requested.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Connector for StaticConnector {
    fn connect(&self, timeout: Timeout) -> Result<Connection> {
        self.requested
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(timeout);
        Ok(self.connection.clone())
    }

    fn server_url(&self) -> Option<String> {
        self.connection
            .is_authenticated()
            .then(|| "memory://test".to_string())
    }
}
