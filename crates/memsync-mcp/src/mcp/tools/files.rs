//! File tools: store, get, share, unshare, list shared.

use super::{format, MemoryTools, ToolOutput};
use crate::mcp::server::{FileParams, GetFileParams, ProjectParams};
use memsync_core::client::{MemoryApi, Timeout};
use memsync_core::codec::{self, BASE64_PREFIX};
use memsync_core::types::StoreFileRequest;
use tracing::info;

impl MemoryTools {
    pub async fn store_file(&self, params: FileParams) -> ToolOutput {
        let (api, project) = self.prepare(Timeout::Transfer, params.project.as_deref())?;
        let file_path = self.relative_path(&params.file_path)?;

        let ctx = self.context();
        let encoded =
            codec::encode_file(&ctx.local_path(&file_path)).map_err(|e| e.user_message())?;
        let kind = if encoded.is_base64() { "binary" } else { "text" };

        let request = StoreFileRequest {
            project: project.clone(),
            file_path: file_path.clone(),
            content: encoded.content,
            content_hash: encoded.hash.clone(),
            machine_id: ctx.machine_id().to_string(),
            session_id: ctx.session_id.clone(),
        };
        let resp = api.store_file(&request).await.map_err(|e| e.user_message())?;
        info!("Stored {} ({} bytes) for {}", file_path, encoded.size, project);

        let mut out = format!(
            "Stored {} in {} ({}, {}, md5 {}).",
            file_path,
            project,
            format::bytes(encoded.size),
            kind,
            encoded.hash
        );
        if resp.deduplicated {
            out.push_str(" Content unchanged since the last stored version.");
        }
        Ok(out)
    }

    pub async fn get_file(&self, params: GetFileParams) -> ToolOutput {
        let (api, project) = self.prepare(Timeout::Transfer, params.project.as_deref())?;
        let file_path = self.relative_path(&params.file_path)?;

        let remote = api
            .latest_file(&project, &file_path)
            .await
            .map_err(|e| e.user_message())?
            .ok_or_else(|| format!("No stored version of {} in {}.", file_path, project))?;

        if params.write {
            let written = codec::decode_to_file(&self.context().local_path(&file_path), &remote.content)
                .map_err(|e| e.user_message())?;
            info!("Wrote {} ({} bytes) from {}", file_path, written, project);
            return Ok(format!(
                "Wrote {} ({}) from {}.",
                file_path,
                format::bytes(written),
                project
            ));
        }

        if remote.content.starts_with(BASE64_PREFIX) {
            let size = codec::decode_bytes(&remote.content)
                .map_err(|e| e.user_message())?
                .len() as u64;
            return Ok(format!(
                "{} is a binary file ({}, md5 {}). Call memory_get_file with write=true to save it.",
                file_path,
                format::bytes(size),
                remote.content_hash
            ));
        }

        let mut out = format!("{} (md5 {})", file_path, remote.content_hash);
        if let Some(ref machine) = remote.machine_id {
            out.push_str(&format!(", stored by {}", machine));
        }
        out.push_str(&format!(":\n\n```\n{}\n```", remote.content.trim_end_matches('\n')));
        Ok(out)
    }

    pub async fn share_file(&self, params: FileParams) -> ToolOutput {
        let (api, project) = self.prepare(Timeout::Metadata, params.project.as_deref())?;
        let file_path = self.relative_path(&params.file_path)?;

        api.share_file(&project, &file_path)
            .await
            .map_err(|e| e.user_message())?;
        info!("Shared {} in {}", file_path, project);

        Ok(format!(
            "Shared {} in {}. It will be kept in sync by memory_sync_files on every machine.",
            file_path, project
        ))
    }

    pub async fn unshare_file(&self, params: FileParams) -> ToolOutput {
        let (api, project) = self.prepare(Timeout::Metadata, params.project.as_deref())?;
        let file_path = self.relative_path(&params.file_path)?;

        api.unshare_file(&project, &file_path)
            .await
            .map_err(|e| e.user_message())?;
        info!("Unshared {} in {}", file_path, project);

        Ok(format!(
            "Stopped sharing {} in {}. Stored versions are kept.",
            file_path, project
        ))
    }

    pub async fn shared_files(&self, params: ProjectParams) -> ToolOutput {
        let (api, project) = self.prepare(Timeout::Metadata, params.project.as_deref())?;

        let files = api.shared_files(&project).await.map_err(|e| e.user_message())?;
        if files.is_empty() {
            return Ok(format!("No shared files for {}.", project));
        }

        let ctx = self.context();
        let lines: Vec<String> = files
            .iter()
            .map(|f| {
                let present = ctx
                    .relative_path(&f.file_path)
                    .map(|rel| ctx.local_path(&rel).is_file())
                    .unwrap_or(false);
                let marker = if present { "✓" } else { "·" };
                let note = if present { "" } else { " (not on this machine)" };
                format!("{} {}{}", marker, f.file_path, note)
            })
            .collect();

        Ok(format!(
            "Shared files for {} ({}):\n{}",
            project,
            files.len(),
            lines.join("\n")
        ))
    }
}
