//! Progress reporting hooks.

use sa_core::Namespace;
use std::fmt;

/// Result of one migration attempt, as reported to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Committed
    Applied,
    /// Executed successfully, rolled back with the rest of the dry run
    DryRun,
    /// Rolled back after an error
    Failed(String),
}

impl fmt::Display for MigrationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Dry runs are marked once in the run summary, not per line
            MigrationOutcome::Applied | MigrationOutcome::DryRun => write!(f, "OK"),
            MigrationOutcome::Failed(err) => write!(f, "{err}"),
        }
    }
}

/// Receives one call per migration attempt.
///
/// Lets the CLI (or anything else) render progress without the engine
/// knowing about an output sink.
pub trait MigrationObserver: Send + Sync {
    /// A namespace is about to be migrated
    fn on_namespace_start(&self, _namespace: &Namespace) {}

    /// A migration attempt finished
    fn on_migration(&self, namespace: &Namespace, version: &str, outcome: &MigrationOutcome);
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl MigrationObserver for NoopObserver {
    fn on_migration(&self, _: &Namespace, _: &str, _: &MigrationOutcome) {}
}
