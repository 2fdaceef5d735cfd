//! Shared-file reconciliation.
//!
//! For one project, brings the working directory and the remote store into
//! agreement for every path in the shared catalog:
//!
//! 1. Fetch the catalog. Empty catalog ends the run with
//!    [`SyncOutcome::NoSharedFiles`].
//! 2. Hash every shared path locally (full re-read). Absent files are submitted
//!    with an empty hash.
//! 3. Submit all hashes in one `sync_status` request.
//! 4. Act on each verdict through [`decide`], which downloads instead of
//!    uploading when the file is not present locally.
//! 5. Transfer divergent files one at a time. A failed transfer is recorded in
//!    [`SyncReport::failed`] and does not stop the others.
//!
//! Consistency model is "last writer observed by hash". There is no merging and
//! no multi-file atomicity.

use crate::client::MemoryApi;
use crate::codec;
use crate::context::AgentContext;
use crate::error::Result;
use crate::types::{FileHash, StoreFileRequest, SyncStatus};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};


/// Local state of one shared path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSnapshot {
    /// Catalog key exactly as the server reported it
    pub file_path: String,
    pub local_path: PathBuf,
    /// Empty when the file does not exist locally
    pub content_hash: String,
    pub exists: bool,
}

impl FileSnapshot {
    pub fn absent(file_path: impl Into<String>, local_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            local_path: local_path.into(),
            content_hash: String::new(),
            exists: false,
        }
    }

    fn as_file_hash(&self) -> FileHash {
        FileHash {
            file_path: self.file_path.clone(),
            content_hash: self.content_hash.clone(),
        }
    }
}

/// Hash the local copy of a catalog path.
///
/// The key is kept verbatim for every server call; only the local location is
/// normalized. Paths that escape the working directory are rejected.
pub fn snapshot(ctx: &AgentContext, file_path: &str) -> Result<FileSnapshot> {
    let local_path = ctx.local_path(&ctx.relative_path(file_path)?);
    let snap = match codec::hash_file(&local_path)? {
        Some(hash) => FileSnapshot {
            file_path: file_path.to_string(),
            local_path,
            content_hash: hash,
            exists: true,
        },
        None => FileSnapshot::absent(file_path, local_path),
    };
    Ok(snap)
}

/// What to do with one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    Download,
    Upload,
    Skip,
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Download => f.write_str("download"),
            Self::Upload => f.write_str("upload"),
            Self::Skip => f.write_str("up to date"),
        }
    }
}

/// Turn a server verdict into an action.
///
/// An upload verdict for a file that is missing locally becomes a download:
/// uploading nothing would overwrite a valid remote version. Unrecognized
/// verdicts yield `None`.
pub fn decide(status: SyncStatus, snapshot: &FileSnapshot) -> Option<FileAction> {
    match status {
        SyncStatus::UpToDate => Some(FileAction::Skip),
        SyncStatus::DownloadNeeded => Some(FileAction::Download),
        SyncStatus::UploadNeeded if !snapshot.exists => Some(FileAction::Download),
        SyncStatus::UploadNeeded => Some(FileAction::Upload),
        SyncStatus::Unknown => None,
    }
}

/// One performed action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncAction {
    pub file_path: String,
    pub action: FileAction,
    /// Transfer size in bytes, when something moved
    pub bytes: Option<u64>,
}

/// A file that could not be brought in sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub file_path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub downloaded: usize,
    pub uploaded: usize,
    pub up_to_date: usize,
    pub failed: Vec<FileFailure>,
    pub actions: Vec<SyncAction>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Files that were transferred in either direction.
    pub fn transferred(&self) -> usize {
        self.downloaded + self.uploaded
    }

    fn record(&mut self, file_path: &str, action: FileAction, bytes: Option<u64>) {
        match action {
            FileAction::Download => self.downloaded += 1,
            FileAction::Upload => self.uploaded += 1,
            FileAction::Skip => self.up_to_date += 1,
        }
        self.actions.push(SyncAction {
            file_path: file_path.to_string(),
            action,
            bytes,
        });
    }

    fn fail(&mut self, file_path: &str, reason: impl Into<String>) {
        let reason = reason.into();
        warn!("Sync failed for {}: {}", file_path, reason);
        self.failed.push(FileFailure {
            file_path: file_path.to_string(),
            reason,
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    NoSharedFiles,
    Synced(SyncReport),
}

/// Runs one reconciliation pass against a [`MemoryApi`].
///
/// Catalog and status requests go through `api`; file transfers go through
/// `transfer`, which defaults to the same client.
pub struct FileSyncer<'a> {
    api: &'a dyn MemoryApi,
    transfer: &'a dyn MemoryApi,
    ctx: &'a AgentContext,
}

impl<'a> FileSyncer<'a> {
    pub fn new(api: &'a dyn MemoryApi, ctx: &'a AgentContext) -> Self {
        Self {
            api,
            transfer: api,
            ctx,
        }
    }

    /// Use a separate client (typically with a longer timeout) for transfers.
    pub fn with_transfer(mut self, transfer: &'a dyn MemoryApi) -> Self {
        self.transfer = transfer;
        self
    }

    /// Reconcile every shared file of `project`.
    ///
    /// Errors from the catalog or status requests abort the run; per-file
    /// transfer errors are collected in the report.
    pub async fn sync(&self, project: &str) -> Result<SyncOutcome> {
        let shared = self.api.shared_files(project).await?;
        if shared.is_empty() {
            info!("No shared files for {}", project);
            return Ok(SyncOutcome::NoSharedFiles);
        }

        let mut report = SyncReport::default();
        let mut snapshots: Vec<FileSnapshot> = Vec::with_capacity(shared.len());
        for file in &shared {
            match snapshot(self.ctx, &file.file_path) {
                Ok(snap) => snapshots.push(snap),
                Err(e) => report.fail(&file.file_path, e.user_message()),
            }
        }

        if snapshots.is_empty() {
            return Ok(SyncOutcome::Synced(report));
        }

        let hashes: Vec<FileHash> = snapshots.iter().map(FileSnapshot::as_file_hash).collect();
        let verdicts: HashMap<String, SyncStatus> = self
            .api
            .sync_status(project, &hashes)
            .await?
            .into_iter()
            .map(|v| (v.file_path, v.status))
            .collect();

        for snap in &snapshots {
            let Some(&status) = verdicts.get(&snap.file_path) else {
                report.fail(&snap.file_path, "no sync status returned");
                continue;
            };

            let Some(action) = decide(status, snap) else {
                report.fail(&snap.file_path, "unrecognized sync status");
                continue;
            };
            debug!(
                "{}: verdict {:?}, exists={}, action {}",
                snap.file_path, status, snap.exists, action
            );

            let result = match action {
                FileAction::Skip => Ok(None),
                FileAction::Download => self.download(project, snap).await.map(Some),
                FileAction::Upload => self.upload(project, snap).await.map(Some),
            };

            match result {
                Ok(bytes) => report.record(&snap.file_path, action, bytes),
                Err(reason) => report.fail(&snap.file_path, reason),
            }
        }

        info!(
            "Sync {}: {} downloaded, {} uploaded, {} up to date, {} failed",
            project,
            report.downloaded,
            report.uploaded,
            report.up_to_date,
            report.failed.len()
        );
        Ok(SyncOutcome::Synced(report))
    }

    async fn download(&self, project: &str, snap: &FileSnapshot) -> std::result::Result<u64, String> {
        let remote = self
            .transfer
            .latest_file(project, &snap.file_path)
            .await
            .map_err(|e| e.user_message())?
            .ok_or_else(|| "no remote content available".to_string())?;

        codec::decode_to_file(&snap.local_path, &remote.content).map_err(|e| e.user_message())
    }

    async fn upload(&self, project: &str, snap: &FileSnapshot) -> std::result::Result<u64, String> {
        let encoded = codec::encode_file(&snap.local_path).map_err(|e| e.user_message())?;

        let request = StoreFileRequest {
            project: project.to_string(),
            file_path: snap.file_path.clone(),
            content: encoded.content,
            content_hash: encoded.hash,
            machine_id: self.ctx.machine_id().to_string(),
            session_id: self.ctx.session_id.clone(),
        };
        self.transfer
            .store_file(&request)
            .await
            .map_err(|e| e.user_message())?;
        Ok(encoded.size)
    }
}
