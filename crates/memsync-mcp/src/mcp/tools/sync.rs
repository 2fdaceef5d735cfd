use super::{format, MemoryTools, ToolOutput};
use crate::mcp::server::ProjectParams;
use memsync_core::client::Timeout;
use memsync_core::FileSyncer;

impl MemoryTools {
    pub async fn sync_files(&self, params: ProjectParams) -> ToolOutput {
        let (api, project) = self.prepare(Timeout::Metadata, params.project.as_deref())?;
        let transfer = self.connect(Timeout::Transfer)?;

        let outcome = FileSyncer::new(api.as_ref(), self.context())
            .with_transfer(transfer.as_ref())
            .sync(&project)
            .await
            .map_err(|e| format!("Sync failed: {}", e.user_message()))?;
        Ok(format::sync_outcome(&project, &outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{context, signed_out, tools};
    use super::super::NOT_AUTHENTICATED;
    use super::*;
    use memsync_core::client::{InMemoryRemote, StaticConnector};
    use std::sync::Arc;
    use memsync_core::codec::encode_bytes;
    use memsync_core::types::SyncStatus;
    use std::fs;
    use tempfile::tempdir;

    fn widgets() -> ProjectParams {
        ProjectParams {
            project: Some("widgets".into()),
        }
    }

    #[tokio::test]
    async fn test_sync_reports_counts() {
        let dir = tempdir().unwrap();
        let remote = InMemoryRemote::new();
        let tools = tools(dir.path(), &remote);

        let out = tools.sync_files(widgets()).await.unwrap();
        assert!(out.starts_with("No shared files for widgets."));

        let a = encode_bytes(b"same");
        fs::write(dir.path().join("a.txt"), b"same").unwrap();
        remote.share("widgets", "a.txt");
        remote.put_file("widgets", "a.txt", &a.content, &a.hash);

        let b = encode_bytes(&[0u8, 9, 9]);
        remote.share("widgets", "b.bin");
        remote.put_file("widgets", "b.bin", &b.content, &b.hash);
        remote.override_verdict("b.bin", SyncStatus::UploadNeeded);

        let out = tools.sync_files(widgets()).await.unwrap();
        assert!(
            out.starts_with("Sync complete for widgets: 1 downloaded, 0 uploaded, 1 up to date"),
            "{out}"
        );
        assert!(out.contains("↓ b.bin (3 B)"));
        assert_eq!(fs::read(dir.path().join("b.bin")).unwrap(), vec![0u8, 9, 9]);
    }

    #[tokio::test]
    async fn test_sync_surfaces_failures() {
        let dir = tempdir().unwrap();
        let remote = InMemoryRemote::new();
        let tools = tools(dir.path(), &remote);

        remote.share("widgets", "a.txt");
        fs::write(dir.path().join("a.txt"), b"local").unwrap();
        remote.fail_transfers("a.txt", "quota exceeded");

        let out = tools.sync_files(widgets()).await.unwrap();
        assert!(out.contains("1 failed"));
        assert!(out.contains("✗ a.txt: quota exceeded"));
    }

    #[tokio::test]
    async fn test_sync_connects_per_timeout_class() {
        let dir = tempdir().unwrap();
        let remote = InMemoryRemote::new();
        let connector = StaticConnector::authenticated(Arc::new(remote.clone()));
        let tools = MemoryTools::new(
            Arc::new(context(dir.path())),
            Arc::new(connector.clone()),
        );

        tools.sync_files(widgets()).await.unwrap();
        assert_eq!(
            connector.requested_timeouts(),
            vec![Timeout::Metadata, Timeout::Transfer]
        );
    }

    #[tokio::test]
    async fn test_sync_requires_auth() {
        let dir = tempdir().unwrap();
        let tools = signed_out(dir.path());
        assert_eq!(tools.sync_files(widgets()).await.unwrap_err(), NOT_AUTHENTICATED);
    }
}
