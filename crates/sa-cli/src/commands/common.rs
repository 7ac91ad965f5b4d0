//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use sa_core::config::IN_MEMORY_DB;
use sa_core::{Config, Namespace};
use sa_db::DuckDbConnector;
use sa_migrate::{DirSource, Runner, RunnerOptions};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and the database is closed cleanly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; main maps it to the exit status without printing.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// A loaded `stdapp.yml` together with the directory it was found in.
pub(crate) struct Project {
    pub(crate) root: PathBuf,
    pub(crate) config: Config,
}

impl Project {
    /// Migrations directory, honoring a `--dir` override.
    ///
    /// Relative overrides resolve against the project root, like the
    /// configured value.
    pub(crate) fn migrations_dir(&self, dir: Option<&Path>) -> PathBuf {
        match dir {
            Some(dir) => self.root.join(dir),
            None => self.config.migrations_dir_absolute(&self.root),
        }
    }

    /// Namespaces to process: the `--schema` list if given, else the
    /// configured domains, else the default namespace.
    pub(crate) fn namespaces(&self, schema: &[Namespace]) -> Vec<Namespace> {
        if schema.is_empty() {
            self.config.namespaces()
        } else {
            schema.to_vec()
        }
    }

    /// Database path, honoring `--database`.
    pub(crate) fn database_path(&self, global: &GlobalArgs) -> String {
        match &global.database {
            Some(path) if path == IN_MEMORY_DB => path.clone(),
            Some(path) => self.root.join(path).display().to_string(),
            None => self.config.database_path_absolute(&self.root),
        }
    }
}

/// Load the project configuration from `--project-dir`.
pub(crate) fn load_project(global: &GlobalArgs) -> Result<Project> {
    let config = Config::load_from_dir(&global.project_dir).with_context(|| {
        format!(
            "Failed to load project at {}",
            global.project_dir.display()
        )
    })?;
    Ok(Project {
        root: global.project_dir.clone(),
        config,
    })
}

/// Build a runner over the project's database and migrations directory.
pub(crate) fn build_runner(
    project: &Project,
    global: &GlobalArgs,
    dir: Option<&Path>,
    schema: &[Namespace],
    dry_run: bool,
) -> Result<Runner> {
    let db_path = project.database_path(global);
    if db_path != IN_MEMORY_DB {
        if let Some(parent) = Path::new(&db_path).parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let connector = DuckDbConnector::new(&db_path)
        .with_context(|| format!("Failed to open database: {db_path}"))?;
    let source = DirSource::new(project.migrations_dir(dir));

    log::debug!(
        "Project '{}': database {}, migrations {}",
        project.config.name,
        db_path,
        source.root().display()
    );

    Ok(Runner::new(
        Arc::new(connector),
        Arc::new(source),
        RunnerOptions {
            namespaces: project.namespaces(schema),
            dry_run,
            app_version: project.config.version.clone(),
        },
    ))
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
