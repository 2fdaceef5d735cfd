//! Git repository context.
//!
//! The agent only needs three facts about the ambient repository: the current
//! branch, the current commit and the `origin` remote URL. They are read by
//! shelling out to `git`; a missing git binary or a non-repository directory
//! simply yields `None` for each.

use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Read-only view of the ambient repository.
pub trait RepoContext: Send + Sync {
    /// Current branch name, `None` when detached or not a repository.
    fn current_branch(&self) -> Option<String>;

    /// Current commit hash.
    fn current_commit(&self) -> Option<String>;

    /// URL of the `origin` remote.
    fn origin_url(&self) -> Option<String>;
}

/// `RepoContext` backed by the git CLI.
#[derive(Debug, Clone)]
pub struct GitCli {
    dir: PathBuf,
    git: Option<PathBuf>,
}

impl GitCli {
    /// Query the repository containing `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let git = which::which("git").ok();
        if git.is_none() {
            debug!("git not found on PATH; repository context disabled");
        }
        Self {
            dir: dir.into(),
            git,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Run a git command and return trimmed stdout on success.
    fn run(&self, args: &[&str]) -> Option<String> {
        let git = self.git.as_ref()?;
        let output = Command::new(git)
            .arg("-C")
            .arg(&self.dir)
            .args(args)
            .output()
            .ok()?;

        if !output.status.success() {
            debug!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return None;
        }

        let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if value.is_empty() { None } else { Some(value) }
    }
}

impl RepoContext for GitCli {
    fn current_branch(&self) -> Option<String> {
        // Detached HEAD reports "HEAD"
        self.run(&["rev-parse", "--abbrev-ref", "HEAD"])
            .filter(|branch| branch != "HEAD")
    }

    fn current_commit(&self) -> Option<String> {
        self.run(&["rev-parse", "HEAD"])
    }

    fn origin_url(&self) -> Option<String> {
        self.run(&["config", "--get", "remote.origin.url"])
    }
}

/// Fixed repository context.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Clone, Default)]
pub struct StaticRepo {
    pub branch: Option<String>,
    pub commit: Option<String>,
    pub origin: Option<String>,
}

#[cfg(any(test, feature = "test-util"))]
impl StaticRepo {
    pub fn with_origin(origin: impl Into<String>) -> Self {
        Self {
            origin: Some(origin.into()),
            ..Default::default()
        }
    }
}

#[cfg(any(test, feature = "test-util"))]
impl RepoContext for StaticRepo {
    fn current_branch(&self) -> Option<String> {
        self.branch.clone()
    }

    fn current_commit(&self) -> Option<String> {
        self.commit.clone()
    }

    fn origin_url(&self) -> Option<String> {
        self.origin.clone()
    }
}
