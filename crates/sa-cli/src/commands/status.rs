//! Status command implementation

use anyhow::{Context, Result};
use sa_migrate::NamespaceStatus;

use crate::cli::{GlobalArgs, OutputFormat, StatusArgs};
use crate::commands::common::{build_runner, load_project};

/// Execute the status command
pub async fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let runner = build_runner(&project, global, args.dir.as_deref(), &args.schema, false)?;

    let statuses = runner
        .status()
        .await
        .context("Failed to read migration status")?;

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&statuses)?),
        OutputFormat::Table => print!("{}", render_table(&statuses)),
    }
    Ok(())
}

fn render_table(statuses: &[NamespaceStatus]) -> String {
    let mut out = String::new();
    for status in statuses {
        out.push_str(&format!(
            "{} ({} applied, {} pending)\n",
            status.namespace,
            status.applied.len(),
            status.pending.len()
        ));
        for version in &status.applied {
            out.push_str(&format!("  applied  {version}\n"));
        }
        for version in &status.pending {
            out.push_str(&format!("  pending  {version}\n"));
        }
    }
    out
}

#[cfg(test)]
#[path = "status_test.rs"]
mod tests;
