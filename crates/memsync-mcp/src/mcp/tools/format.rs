//! Text rendering for tool results.

use chrono::{DateTime, Local};
use memsync_core::sync::{FileAction, SyncOutcome};
use memsync_core::types::{LogEntry, SessionSummary};
use std::fmt::Write as _;

/// Render a server timestamp in local time, falling back to the raw string.
pub fn timestamp(raw: Option<&str>) -> String {
    match raw {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|_| raw.to_string()),
        None => "unknown time".to_string(),
    }
}

pub fn bytes(size: u64) -> String {
    const KB: f64 = 1024.0;
    let size_f = size as f64;
    if size_f < KB {
        format!("{} B", size)
    } else if size_f < KB * KB {
        format!("{:.1} KB", size_f / KB)
    } else {
        format!("{:.1} MB", size_f / (KB * KB))
    }
}

pub fn short_commit(commit: &str) -> &str {
    commit.get(..7).unwrap_or(commit)
}

/// One entry as a block: header line, then content.
pub fn entry(entry: &LogEntry) -> String {
    let mut header = format!(
        "[{}] {}",
        timestamp(entry.created_at.as_deref()),
        entry.entry_type
    );

    let origin: Vec<&str> = [
        entry.machine_name.as_deref().or(entry.machine_id.as_deref()),
        entry.git_branch.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !origin.is_empty() {
        let _ = write!(header, " ({})", origin.join(", "));
    }
    if !entry.tags.is_empty() {
        let _ = write!(header, " #{}", entry.tags.join(" #"));
    }

    format!("{}\n{}", header, entry.content.trim_end())
}

pub fn entries(entries: &[LogEntry]) -> String {
    entries.iter().map(entry).collect::<Vec<_>>().join("\n\n")
}

pub fn session(session: &SessionSummary) -> String {
    let machine = session
        .machine_name
        .as_deref()
        .or(session.machine_id.as_deref())
        .unwrap_or("unknown machine");
    let marker = if session.is_remote { " [remote]" } else { "" };

    let mut out = format!(
        "- {} on {}{}: {} entr{}, {} to {}",
        session.session_id,
        machine,
        marker,
        session.log_count,
        if session.log_count == 1 { "y" } else { "ies" },
        timestamp(session.started_at.as_deref()),
        timestamp(session.ended_at.as_deref()),
    );

    if let Some(ref branch) = session.git_branch {
        let _ = write!(out, "\n  branch: {}", branch);
        if let Some(ref commit) = session.git_commit {
            let _ = write!(out, " @ {}", short_commit(commit));
        }
    }
    if let Some(ref dir) = session.directory {
        let _ = write!(out, "\n  directory: {}", dir);
    }
    if let Some(ref summary) = session.summary {
        let _ = write!(out, "\n  summary: {}", summary.trim());
    }
    out
}

pub fn sync_outcome(project: &str, outcome: &SyncOutcome) -> String {
    let report = match outcome {
        SyncOutcome::NoSharedFiles => {
            return format!(
                "No shared files for {}. Use memory_share_file to mark files for sync.",
                project
            );
        }
        SyncOutcome::Synced(report) => report,
    };

    let mut out = format!(
        "Sync complete for {}: {} downloaded, {} uploaded, {} up to date",
        project, report.downloaded, report.uploaded, report.up_to_date
    );
    if !report.failed.is_empty() {
        let _ = write!(out, ", {} failed", report.failed.len());
    }

    let transfers: Vec<_> = report
        .actions
        .iter()
        .filter(|a| a.action != FileAction::Skip)
        .collect();
    if !transfers.is_empty() {
        out.push('\n');
        for action in transfers {
            let arrow = match action.action {
                FileAction::Download => "↓",
                _ => "↑",
            };
            let size = action.bytes.map(|b| format!(" ({})", bytes(b))).unwrap_or_default();
            let _ = write!(out, "\n{} {}{}", arrow, action.file_path, size);
        }
    }

    if !report.failed.is_empty() {
        out.push_str("\n\nFailed:");
        for failure in &report.failed {
            let _ = write!(out, "\n✗ {}: {}", failure.file_path, failure.reason);
        }
    }
    out
}
