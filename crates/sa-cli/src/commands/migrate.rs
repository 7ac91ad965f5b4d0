//! Migrate command implementation

use anyhow::{Context, Result};
use sa_core::Namespace;
use sa_migrate::{CancelSignal, MigrationObserver, MigrationOutcome, RunReport};

use crate::cli::{GlobalArgs, MigrateArgs};
use crate::commands::common::{build_runner, load_project, ExitCode};

/// Prints one line per migration attempt, with a header per namespace when
/// more than one is processed.
struct ProgressPrinter {
    show_headers: bool,
}

impl MigrationObserver for ProgressPrinter {
    fn on_namespace_start(&self, namespace: &Namespace) {
        if self.show_headers {
            println!("\n== {} ==", namespace);
        }
    }

    fn on_migration(&self, _namespace: &Namespace, version: &str, outcome: &MigrationOutcome) {
        println!("{}", progress_line(version, outcome));
    }
}

fn progress_line(version: &str, outcome: &MigrationOutcome) -> String {
    format!("{version}: {outcome}")
}

/// Execute the migrate command
pub async fn execute(args: &MigrateArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let cancel = CancelSignal::new();
    let runner = build_runner(
        &project,
        global,
        args.dir.as_deref(),
        &args.schema,
        args.dry,
    )?
    .with_cancel(cancel.clone());

    // The in-flight migration finishes or rolls back; nothing after it starts.
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupted, stopping after the current migration...");
            cancel.cancel();
        }
    });

    let observer = ProgressPrinter {
        show_headers: runner.namespaces().len() > 1,
    };
    let result = runner.run(&observer).await;
    interrupt.abort();

    let report = result.context("Failed to load migrations")?;
    print_summary(&report);

    if !report.is_success() {
        return Err(ExitCode(1).into());
    }
    Ok(())
}

fn print_summary(report: &RunReport) {
    for failure in report.failures() {
        if let Some(err) = &failure.error {
            eprintln!("Namespace '{}' failed: {}", failure.namespace, err);
        }
    }
    if report.cancelled {
        eprintln!("Cancelled before all namespaces were migrated");
    }

    let count = report.applied_count();
    let plural = if count == 1 { "" } else { "s" };
    println!();
    if report.dry_run {
        println!("Dry run: {count} migration{plural} succeeded and were rolled back");
    } else if count == 0 && report.is_success() {
        println!("Nothing to migrate");
    } else {
        println!("Applied {count} migration{plural}");
    }
}

#[cfg(test)]
#[path = "migrate_test.rs"]
mod tests;
