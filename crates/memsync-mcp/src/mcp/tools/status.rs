use super::{format, MemoryTools};
use memsync_core::client::{Connection, Timeout};
use memsync_core::ProjectSource;

impl MemoryTools {
    /// Status report. Never requires authentication.
    pub fn status(&self) -> String {
        let ctx = self.context();
        let mut lines = Vec::new();

        let auth = match self.connector.connect(Timeout::Metadata) {
            Ok(Connection::Authenticated(_)) => match self.connector.server_url() {
                Some(url) => format!("connected to {}", url),
                None => "connected".to_string(),
            },
            Ok(Connection::Unauthenticated) => {
                "not authenticated (run `memsync login --server <url>`)".to_string()
            }
            Err(e) => format!("unavailable: {}", e.user_message()),
        };
        lines.push(format!("Server: {}", auth));
        lines.push(format!(
            "Machine: {} ({})",
            ctx.machine.alias, ctx.machine.machine_id
        ));
        lines.push(format!("Session: {}", ctx.session_id));
        lines.push(format!("Directory: {}", ctx.workdir.display()));

        let project = match ctx.resolve_project(None) {
            Some(p) => {
                let source = match p.source {
                    ProjectSource::Explicit => "explicit",
                    ProjectSource::GitOrigin => "git origin",
                    ProjectSource::Directory => "directory name",
                };
                format!("{} (from {})", p.key, source)
            }
            None => "unresolved, pass `project` to each tool".to_string(),
        };
        lines.push(format!("Project: {}", project));

        let git = match (ctx.repo.current_branch(), ctx.repo.current_commit()) {
            (Some(branch), Some(commit)) => format!("{} @ {}", branch, format::short_commit(&commit)),
            (Some(branch), None) => branch,
            (None, Some(commit)) => format!("detached @ {}", format::short_commit(&commit)),
            (None, None) => "not a git repository".to_string(),
        };
        lines.push(format!("Git: {}", git));

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{signed_out, tools};
    use memsync_core::client::InMemoryRemote;
    use tempfile::tempdir;

    #[test]
    fn test_status_signed_out() {
        let dir = tempdir().unwrap();
        let out = signed_out(dir.path()).status();
        assert!(out.contains("Server: not authenticated"));
        assert!(out.contains("Machine: laptop (laptop-0a1b2c3d)"));
        assert!(out.contains("Session: session-test"));
        assert!(out.contains("(from directory name)"));
        assert!(out.contains("Git: main @ abc123"));
    }

    #[test]
    fn test_status_connected() {
        let dir = tempdir().unwrap();
        let out = tools(dir.path(), &InMemoryRemote::new()).status();
        assert!(out.contains("Server: connected to memory://test"));
    }
}
