//! Versioned SQL migration engine for stdapp.
//!
//! Migrations are script files named `<version>.<ext>`. The engine records
//! every committed version in a `_migrations` table inside the target
//! namespace, computes the pending subset, and applies each pending script in
//! its own transaction together with its tracking row. The [`Runner`] replays
//! one loaded [`MigrationSet`] across any number of namespaces.

pub mod cancel;
pub mod engine;
pub mod error;
pub mod migration;
pub mod observer;
pub mod runner;
pub mod source;
pub mod state;

pub use cancel::CancelSignal;
pub use engine::{Engine, EngineState};
pub use error::{MigrateError, MigrateResult, SourceLoadError};
pub use migration::{Migration, MigrationSet};
pub use observer::{MigrationObserver, MigrationOutcome, NoopObserver};
pub use runner::{NamespaceReport, NamespaceStatus, RunReport, Runner, RunnerOptions};
pub use source::{DirSource, MigrationSource, StaticSource};
pub use state::{AppliedState, StateStore, TRACKING_TABLE};

#[cfg(test)]
pub(crate) mod test_utils;
