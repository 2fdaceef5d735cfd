//! Project resolution.
//!
//! Every remote operation is scoped to a project key. The key is taken, in order,
//! from an explicit argument, the repository's `origin` URL, or the working
//! directory's name. The server treats the key as opaque, so no normalization
//! is applied.

use crate::git::RepoContext;
use std::path::Path;
use tracing::debug;

/// Where a resolved project key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectSource {
    Explicit,
    GitOrigin,
    Directory,
}

/// A resolved project key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProject {
    pub key: String,
    pub source: ProjectSource,
}

/// Resolve the project key.
///
/// Returns `None` when nothing is explicit, there is no origin remote, and the
/// working directory is the filesystem root.
pub fn resolve_project(
    explicit: Option<&str>,
    repo: &dyn RepoContext,
    workdir: &Path,
) -> Option<ResolvedProject> {
    if let Some(project) = explicit.filter(|p| !p.is_empty()) {
        return Some(ResolvedProject {
            key: project.to_string(),
            source: ProjectSource::Explicit,
        });
    }

    if let Some(origin) = repo.origin_url() {
        debug!("Resolved project from git origin: {}", origin);
        return Some(ResolvedProject {
            key: origin,
            source: ProjectSource::GitOrigin,
        });
    }

    // Root has no file name; `..`-terminated paths are treated the same way
    let name = workdir.file_name()?.to_string_lossy().to_string();
    if name.is_empty() {
        return None;
    }

    debug!("Resolved project from directory name: {}", name);
    Some(ResolvedProject {
        key: name,
        source: ProjectSource::Directory,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::StaticRepo;
    use std::path::PathBuf;

    #[test]
    fn test_explicit_wins() {
        let repo = StaticRepo::with_origin("git@github.com:acme/widgets.git");
        let resolved = resolve_project(Some("my-notes"), &repo, Path::new("/work/widgets")).unwrap();
        assert_eq!(resolved.key, "my-notes");
        assert_eq!(resolved.source, ProjectSource::Explicit);
    }

    #[test]
    fn test_explicit_is_verbatim() {
        let repo = StaticRepo::default();
        let resolved =
            resolve_project(Some("  https://github.com/Acme/X.git "), &repo, Path::new("/")).unwrap();
        assert_eq!(resolved.key, "  https://github.com/Acme/X.git ");
    }

    #[test]
    fn test_origin_over_directory() {
        let repo = StaticRepo::with_origin("https://github.com/acme/widgets.git");
        let resolved = resolve_project(None, &repo, Path::new("/work/widgets")).unwrap();
        assert_eq!(resolved.key, "https://github.com/acme/widgets.git");
        assert_eq!(resolved.source, ProjectSource::GitOrigin);
    }

    #[test]
    fn test_empty_explicit_falls_through() {
        let repo = StaticRepo::default();
        let resolved = resolve_project(Some(""), &repo, Path::new("/work/widgets")).unwrap();
        assert_eq!(resolved.key, "widgets");
        assert_eq!(resolved.source, ProjectSource::Directory);
    }

    #[test]
    fn test_root_fails() {
        let repo = StaticRepo::default();
        let root: PathBuf = std::path::Component::RootDir.as_os_str().into();
        assert_eq!(resolve_project(None, &repo, &root), None);
    }

    #[test]
    fn test_root_with_origin_still_resolves() {
        let repo = StaticRepo::with_origin("git@host:r.git");
        let resolved = resolve_project(None, &repo, Path::new("/")).unwrap();
        assert_eq!(resolved.key, "git@host:r.git");
    }
}
