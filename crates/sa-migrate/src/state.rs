//! Persistent record of committed migration versions.

use crate::error::{MigrateError, MigrateResult};
use crate::migration::MigrationSet;
use sa_core::Namespace;
use sa_db::{Database, DbResult};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Name of the tracking relation created inside every namespace.
pub const TRACKING_TABLE: &str = "_migrations";

/// Versions known to be durably committed in one namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppliedState {
    versions: BTreeSet<String>,
}

impl AppliedState {
    pub fn contains(&self, version: &str) -> bool {
        self.versions.contains(version)
    }

    /// Committed versions, ascending.
    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.versions.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Versions of `set` not committed yet, ascending.
    pub fn pending_in(&self, set: &MigrationSet) -> Vec<String> {
        set.versions()
            .filter(|v| !self.contains(v))
            .map(String::from)
            .collect()
    }

    pub(crate) fn insert(&mut self, version: &str) {
        self.versions.insert(version.to_string());
    }
}

impl FromIterator<String> for AppliedState {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            versions: iter.into_iter().collect(),
        }
    }
}

/// Reads and writes the `_migrations` table of one namespace.
pub struct StateStore {
    db: Arc<dyn Database>,
    // quoted, for SQL text
    table: String,
    // unquoted `schema.table`, for catalog lookups
    relation: String,
}

impl StateStore {
    pub fn new(db: Arc<dyn Database>, namespace: &Namespace) -> Self {
        Self {
            db,
            table: namespace.qualify(TRACKING_TABLE),
            relation: format!("{namespace}.{TRACKING_TABLE}"),
        }
    }

    /// Create the tracking table if it is missing. Safe to call on every run.
    pub async fn ensure_tracking_table(&self) -> MigrateResult<()> {
        let sql = format!(
            "create table if not exists {} (version varchar unique not null);",
            self.table
        );
        self.db.execute_batch(&sql).await.map_err(|e| {
            MigrateError::Configuration(format!(
                "failed to create tracking table {}: {e}",
                self.table
            ))
        })
    }

    /// Load every committed version.
    pub async fn load_applied(&self) -> MigrateResult<AppliedState> {
        let sql = format!("select version from {}", self.table);
        let versions = self.db.query_strings(&sql).await.map_err(|e| {
            MigrateError::Configuration(format!(
                "failed to read tracking table {}: {e}",
                self.table
            ))
        })?;
        Ok(versions.into_iter().collect())
    }

    /// Load committed versions without creating anything. A namespace that
    /// has never been migrated has no tracking table and nothing applied.
    pub async fn read_applied(&self) -> MigrateResult<AppliedState> {
        let exists = self.db.relation_exists(&self.relation).await.map_err(|e| {
            MigrateError::Configuration(format!(
                "failed to look up tracking table {}: {e}",
                self.table
            ))
        })?;
        if !exists {
            return Ok(AppliedState::default());
        }
        self.load_applied().await
    }

    /// Insert the tracking row for `version` on the current session.
    ///
    /// Must run inside the transaction that executes the migration body.
    pub async fn record(&self, version: &str) -> DbResult<()> {
        let sql = format!("insert into {} values (?)", self.table);
        self.db.execute_with_params(&sql, &[version]).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
