//! Per-process agent context.
//!
//! Built once at startup and handed to every component. Holds the machine
//! identity, the session id for this process, the working directory and the
//! repository capability.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::git::{GitCli, RepoContext};
use crate::machine::{MachineIdentity, MachineStore};
use crate::project::{resolve_project, ResolvedProject};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct AgentContext {
    pub machine: MachineIdentity,
    pub session_id: String,
    pub workdir: PathBuf,
    pub repo: Arc<dyn RepoContext>,
}

impl AgentContext {
    pub fn new(
        machine: MachineIdentity,
        session_id: impl Into<String>,
        workdir: impl Into<PathBuf>,
        repo: Arc<dyn RepoContext>,
    ) -> Self {
        Self {
            machine,
            session_id: session_id.into(),
            workdir: workdir.into(),
            repo,
        }
    }

    /// Load (or create) the machine identity and start a new session rooted at
    /// the current directory.
    pub fn bootstrap(config: &Config) -> Result<Self> {
        let machine = MachineStore::new(config.paths.machine_file()).load_or_create()?;
        let workdir = std::env::current_dir()?;
        let session_id = uuid::Uuid::new_v4().to_string();
        debug!(
            "Agent context: machine={} session={} workdir={:?}",
            machine.machine_id, session_id, workdir
        );

        let repo = Arc::new(GitCli::new(&workdir));
        Ok(Self::new(machine, session_id, workdir, repo))
    }

    pub fn machine_id(&self) -> &str {
        &self.machine.machine_id
    }

    pub fn resolve_project(&self, explicit: Option<&str>) -> Option<ResolvedProject> {
        resolve_project(explicit, self.repo.as_ref(), &self.workdir)
    }

    /// Workdir directory name, reported as the entry's `directory`.
    pub fn directory(&self) -> Option<String> {
        self.workdir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
    }

    /// Normalize a user- or server-supplied path to a project-relative one.
    ///
    /// Absolute paths inside the working directory are made relative. Paths
    /// that would escape it are rejected.
    pub fn relative_path(&self, path: &str) -> Result<String> {
        let raw = Path::new(path.trim());
        let relative = if raw.is_absolute() {
            raw.strip_prefix(&self.workdir)
                .map_err(|_| Error::InvalidPath(path.to_string()))?
        } else {
            raw
        };

        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy().to_string()),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(Error::InvalidPath(path.to_string()));
                }
            }
        }

        if parts.is_empty() {
            return Err(Error::InvalidPath(path.to_string()));
        }
        Ok(parts.join("/"))
    }

    /// Location on disk of a project-relative path.
    pub fn local_path(&self, relative: &str) -> PathBuf {
        self.workdir.join(relative)
    }
}
