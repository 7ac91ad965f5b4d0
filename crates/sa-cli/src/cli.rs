//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};
use sa_core::Namespace;
use std::path::PathBuf;

/// stdapp - versioned SQL migrations for DuckDB
#[derive(Parser, Debug)]
#[command(name = "sa")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: PathBuf,

    /// Override the configured database path
    #[arg(long, global = true)]
    pub database: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply pending migrations
    Migrate(MigrateArgs),

    /// Create a new, empty migration file
    Migration(MigrationArgs),

    /// Show applied and pending migrations
    Status(StatusArgs),
}

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Run every migration, then roll it back
    #[arg(long)]
    pub dry: bool,

    /// Override the migrations directory
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Namespaces to migrate (comma-separated, default: configured domains)
    #[arg(short, long, value_delimiter = ',', value_parser = parse_namespace)]
    pub schema: Vec<Namespace>,
}

/// Arguments for the migration command
#[derive(Args, Debug)]
pub struct MigrationArgs {
    /// Descriptive name, e.g. create_users
    pub name: String,

    /// Override the migrations directory
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Override the migrations directory
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Namespaces to inspect (comma-separated, default: configured domains)
    #[arg(short, long, value_delimiter = ',', value_parser = parse_namespace)]
    pub schema: Vec<Namespace>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

/// Output formats for reporting commands
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
}

fn parse_namespace(s: &str) -> Result<Namespace, String> {
    Namespace::try_from(s)
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
