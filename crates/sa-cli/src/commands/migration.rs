//! Migration command implementation: scaffolds a new migration file

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::{GlobalArgs, MigrationArgs};
use crate::commands::common::load_project;

/// Execute the migration command
pub async fn execute(args: &MigrationArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let dir = project.migrations_dir(args.dir.as_deref());

    let path = create_migration(&dir, &args.name, Utc::now())?;
    println!("{}", path.display());
    Ok(())
}

/// Create an empty `<YYYYMMDDHHMMSS>_<name>.sql` file under `dir`.
fn create_migration(dir: &Path, name: &str, now: DateTime<Utc>) -> Result<PathBuf> {
    validate_name(name)?;

    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;

    let path = dir.join(format!("{}_{}.sql", now.format("%Y%m%d%H%M%S"), name));
    if path.exists() {
        bail!("Migration already exists: {}", path.display());
    }
    fs::write(&path, "").with_context(|| format!("Failed to write {}", path.display()))?;

    log::debug!("Created migration {}", path.display());
    Ok(path)
}

/// Names become part of the version, which ends at the first '.'.
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("Migration name cannot be empty");
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        bail!(
            "Invalid character '{}' in migration name '{}': use letters, digits, '_' or '-'",
            c,
            name
        );
    }
    Ok(())
}

#[cfg(test)]
#[path = "migration_test.rs"]
mod tests;
