//! Error types for the migration engine.

use sa_db::DbError;
use thiserror::Error;

/// Problems found while turning a source tree into a [`crate::MigrationSet`].
///
/// Always raised before any database interaction.
#[derive(Error, Debug)]
pub enum SourceLoadError {
    /// File name has no `.` or an empty version segment.
    #[error("malformed migration file name '{name}' at {path}: expected <version>.<ext>")]
    MalformedName { name: String, path: String },

    /// Two files resolve to the same version.
    #[error("duplicate migration version '{version}': {first} and {second}")]
    DuplicateVersion {
        version: String,
        first: String,
        second: String,
    },

    /// The source tree could not be read.
    #[error("failed to read migration source '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Migration engine errors.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Migration source could not be loaded (M001).
    #[error("[M001] Migration source could not be loaded: {0}")]
    SourceLoad(#[from] SourceLoadError),

    /// Tracking table or namespace session could not be set up (M002).
    #[error("[M002] Migration configuration error: {0}")]
    Configuration(String),

    /// Version is not part of the loaded set (M003).
    #[error("[M003] No such migration: {0}")]
    NotFound(String),

    /// Tracking insert, script body, or commit failed; the transaction was
    /// rolled back (M004).
    #[error("[M004] Migration {version} failed: {cause}")]
    Execution {
        version: String,
        #[source]
        cause: DbError,
    },

    /// Engine used before `initialize()` (M005).
    #[error("[M005] Migration engine used before initialize()")]
    NotInitialized,

    /// Cancellation was requested while applying a version (M006).
    #[error("[M006] Migration {version} cancelled")]
    Cancelled { version: String },
}

impl MigrateError {
    pub(crate) fn execution(version: &str, cause: DbError) -> Self {
        MigrateError::Execution {
            version: version.to_string(),
            cause,
        }
    }
}

/// Result type alias for [`MigrateError`].
pub type MigrateResult<T> = Result<T, MigrateError>;
