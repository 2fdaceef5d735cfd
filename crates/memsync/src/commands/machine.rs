//! Machine identity command.

use anyhow::{bail, Result};
use colored::Colorize;
use memsync_core::{Config, MachineStore};

pub fn execute(alias: Option<&str>, config: &Config) -> Result<()> {
    let store = MachineStore::new(config.paths.machine_file());

    let identity = match alias {
        Some(alias) if alias.trim().is_empty() => bail!("Alias must not be empty"),
        Some(alias) => {
            let identity = store.set_alias(alias)?;
            println!("{} Alias set to {}", "✓".green(), identity.alias.cyan());
            identity
        }
        None => store.load_or_create()?,
    };

    println!("  Machine ID: {}", identity.machine_id.yellow());
    println!("  Alias:      {}", identity.alias);
    println!("  Stored in:  {}", store.path().display().to_string().dimmed());
    Ok(())
}
