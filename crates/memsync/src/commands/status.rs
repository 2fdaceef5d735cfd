//! Status command.
//!
//! Prints authentication, machine identity, resolved project and git context.
//! Works without credentials.

use anyhow::Result;
use colored::Colorize;
use memsync_core::git::RepoContext;
use memsync_core::{AgentContext, Config, CredentialStore, ProjectSource};

pub fn execute(config: &Config) -> Result<()> {
    let ctx = AgentContext::bootstrap(config)?;

    println!("{}", "memsync status".bold());
    println!();

    match CredentialStore::new(config.paths.credentials_file()).load() {
        Ok(Some(creds)) => println!(
            "  {} Server:    {} (token {})",
            "✓".green(),
            creds.server_url.cyan(),
            creds.token_hint()
        ),
        Ok(None) => println!(
            "  {} Server:    not authenticated, run {}",
            "✗".red(),
            "memsync login --server <url>".cyan()
        ),
        Err(e) => println!("  {} Server:    {}", "✗".red(), e),
    }

    println!(
        "  {} Machine:   {} ({})",
        "●".cyan(),
        ctx.machine.alias,
        ctx.machine.machine_id.dimmed()
    );
    println!("  {} Directory: {}", "●".cyan(), ctx.workdir.display());

    match ctx.resolve_project(None) {
        Some(project) => {
            let source = match project.source {
                ProjectSource::Explicit => "explicit",
                ProjectSource::GitOrigin => "git origin",
                ProjectSource::Directory => "directory name",
            };
            println!(
                "  {} Project:   {} {}",
                "●".cyan(),
                project.key.yellow(),
                format!("(from {})", source).dimmed()
            );
        }
        None => println!(
            "  {} Project:   unresolved, pass {}",
            "⚠".yellow(),
            "--project".cyan()
        ),
    }

    print_git(ctx.repo.as_ref());
    println!();
    println!("  Config: {}", config.paths.config_file.display().to_string().dimmed());
    Ok(())
}

fn print_git(repo: &dyn RepoContext) {
    match (repo.current_branch(), repo.current_commit()) {
        (None, None) => println!("  {} Git:       not a repository", "○".dimmed()),
        (branch, commit) => {
            let commit = commit
                .map(|c| c.chars().take(7).collect::<String>())
                .unwrap_or_else(|| "no commits".to_string());
            println!(
                "  {} Git:       {} @ {}",
                "●".cyan(),
                branch.unwrap_or_else(|| "detached".to_string()).green(),
                commit
            );
        }
    }
}
