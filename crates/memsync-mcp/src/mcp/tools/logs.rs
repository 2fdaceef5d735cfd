//! Memory entry tools: log, recent, sessions, search.

use super::{format, MemoryTools, ToolOutput};
use crate::mcp::server::{ListParams, LogParams, SearchParams};
use memsync_core::client::{MemoryApi, Timeout};
use memsync_core::types::{NewLogEntry, SearchQuery};
use tracing::info;

const DEFAULT_RECENT_LIMIT: u32 = 20;
const DEFAULT_SESSIONS_LIMIT: u32 = 10;
const DEFAULT_SEARCH_LIMIT: u32 = 20;

fn limit_or(limit: Option<u32>, default: u32) -> u32 {
    limit.filter(|&l| l > 0).unwrap_or(default)
}

impl MemoryTools {
    pub async fn log(&self, params: LogParams) -> ToolOutput {
        let (api, project) = self.prepare(Timeout::Metadata, params.project.as_deref())?;
        if params.content.trim().is_empty() {
            return Err("Nothing to log: content is empty.".to_string());
        }

        let ctx = self.context();
        let kind = params.kind;
        let entry = NewLogEntry {
            project: project.clone(),
            entry_type: kind.into(),
            content: params.content,
            tags: params.tags.unwrap_or_default(),
            session_id: params
                .session_id
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| ctx.session_id.clone()),
            machine_id: ctx.machine_id().to_string(),
            git_branch: ctx.repo.current_branch(),
            git_commit: ctx.repo.current_commit(),
            directory: ctx.directory(),
        };

        let resp = api.append_log(&entry).await.map_err(|e| e.user_message())?;
        info!("Logged {} entry for {}", kind.as_str(), project);

        let id = resp.id.map(|id| format!(" ({})", id)).unwrap_or_default();
        Ok(format!("Logged {} for {}{}.", kind.as_str(), project, id))
    }

    pub async fn recent(&self, params: ListParams) -> ToolOutput {
        let (api, project) = self.prepare(Timeout::Metadata, params.project.as_deref())?;
        let limit = limit_or(params.limit, DEFAULT_RECENT_LIMIT);

        let logs = api
            .recent_logs(&project, limit)
            .await
            .map_err(|e| e.user_message())?;
        if logs.is_empty() {
            return Ok(format!("No memory entries for {} yet.", project));
        }

        Ok(format!(
            "Recent memory for {} ({} entr{}):\n\n{}",
            project,
            logs.len(),
            if logs.len() == 1 { "y" } else { "ies" },
            format::entries(&logs)
        ))
    }

    pub async fn sessions(&self, params: ListParams) -> ToolOutput {
        let (api, project) = self.prepare(Timeout::Metadata, params.project.as_deref())?;
        let limit = limit_or(params.limit, DEFAULT_SESSIONS_LIMIT);

        let list = api
            .sessions(&project, self.context().machine_id(), limit)
            .await
            .map_err(|e| e.user_message())?;
        if list.sessions.is_empty() {
            return Ok(format!("No sessions recorded for {} yet.", project));
        }

        let lines: Vec<String> = list.sessions.iter().map(format::session).collect();
        let mut out = format!("Sessions for {}:\n\n{}", project, lines.join("\n"));
        if list.has_remote_activity() {
            out.push_str("\n\nOther machines have worked on this project. Check memory_recent and run memory_sync_files before continuing.");
        }
        Ok(out)
    }

    pub async fn search(&self, params: SearchParams) -> ToolOutput {
        let (api, project) = self.prepare(Timeout::Metadata, params.project.as_deref())?;
        let query = params.query.trim();
        if query.is_empty() {
            return Err("Search query must not be empty.".to_string());
        }

        let search = SearchQuery {
            query: query.to_string(),
            project: Some(project.clone()),
            entry_type: params.kind.map(Into::into),
            limit: limit_or(params.limit, DEFAULT_SEARCH_LIMIT),
        };
        let results = api.search_logs(&search).await.map_err(|e| e.user_message())?;
        if results.is_empty() {
            return Ok(format!("No entries in {} match \"{}\".", project, query));
        }

        Ok(format!(
            "{} result{} for \"{}\" in {}:\n\n{}",
            results.len(),
            if results.len() == 1 { "" } else { "s" },
            query,
            project,
            format::entries(&results)
        ))
    }
}
