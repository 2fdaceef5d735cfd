//! One-shot shared-file sync.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use memsync_core::client::{Connection, Connector, CredentialConnector, MemoryApi, Timeout};
use memsync_core::sync::{FileAction, SyncReport};
use memsync_core::{AgentContext, Config, FileSyncer, SyncOutcome};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn connect(connector: &dyn Connector, timeout: Timeout) -> Result<Arc<dyn MemoryApi>> {
    match connector.connect(timeout)? {
        Connection::Authenticated(api) => Ok(api),
        Connection::Unauthenticated => {
            bail!("Not authenticated. Run `memsync login --server <url>` first.")
        }
    }
}

pub async fn execute(project: Option<&str>, config: &Config) -> Result<()> {
    let ctx = AgentContext::bootstrap(config)?;

    let connector = CredentialConnector::from_config(config);
    let api = connect(&connector, Timeout::Metadata)?;
    let transfer = connect(&connector, Timeout::Transfer)?;

    let Some(project) = ctx.resolve_project(project) else {
        bail!("Could not determine the project for this directory. Pass --project.");
    };
    debug!("Syncing {} ({:?}) from {:?}", project.key, project.source, ctx.workdir);

    let progress = spinner(format!("Syncing shared files for {}...", project.key));
    let outcome = FileSyncer::new(api.as_ref(), &ctx)
        .with_transfer(transfer.as_ref())
        .sync(&project.key)
        .await
        .with_context(|| format!("Sync failed for {}", project.key));
    progress.finish_and_clear();

    match outcome? {
        SyncOutcome::NoSharedFiles => {
            println!("{} No shared files for {}", "○".dimmed(), project.key.yellow());
            Ok(())
        }
        SyncOutcome::Synced(report) => {
            print_report(&project.key, &report);
            if !report.is_clean() {
                bail!("{} file(s) failed to sync", report.failed.len());
            }
            Ok(())
        }
    }
}

fn print_report(project: &str, report: &SyncReport) {
    for action in &report.actions {
        match action.action {
            FileAction::Download => println!("  {} {}", "↓".green(), action.file_path),
            FileAction::Upload => println!("  {} {}", "↑".cyan(), action.file_path),
            FileAction::Skip => {}
        }
    }
    for failure in &report.failed {
        println!("  {} {}: {}", "✗".red(), failure.file_path, failure.reason);
    }

    let mark = if report.is_clean() { "✓".green() } else { "⚠".yellow() };
    println!(
        "{} {}: {} downloaded, {} uploaded, {} up to date, {} failed",
        mark,
        project.yellow(),
        report.downloaded,
        report.uploaded,
        report.up_to_date,
        report.failed.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use memsync_core::client::{InMemoryRemote, StaticConnector};

    #[test]
    fn test_connect_passes_timeout_class() {
        let connector = StaticConnector::authenticated(Arc::new(InMemoryRemote::new()));
        connect(&connector, Timeout::Metadata).unwrap();
        connect(&connector, Timeout::Transfer).unwrap();
        assert_eq!(
            connector.requested_timeouts(),
            vec![Timeout::Metadata, Timeout::Transfer]
        );
    }

    #[test]
    fn test_connect_requires_login() {
        let err = connect(&StaticConnector::unauthenticated(), Timeout::Metadata)
            .err()
            .unwrap();
        assert!(err.to_string().starts_with("Not authenticated"));
    }
}
