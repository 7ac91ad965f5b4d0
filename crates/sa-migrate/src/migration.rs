//! Migration entries and the ordered, version-keyed migration set.

use crate::error::SourceLoadError;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Separator between the version and the rest of a migration file name.
pub const VERSION_DELIMITER: char = '.';

/// A named, versioned unit of schema-change script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    /// Sortable identifier derived from the file name
    pub version: String,
    /// Raw script text, executed verbatim
    pub body: Vec<u8>,
}

/// Extract the version from a migration file name.
///
/// The version is everything before the first `.`; `None` if there is no
/// delimiter or the version segment is empty.
pub fn parse_version(file_name: &str) -> Option<&str> {
    match file_name.split_once(VERSION_DELIMITER) {
        Some((version, _)) if !version.is_empty() => Some(version),
        _ => None,
    }
}

/// Migrations sorted ascending by version, with no duplicate versions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationSet {
    migrations: Vec<Migration>,
}

impl MigrationSet {
    /// Start collecting migration files.
    pub fn builder() -> MigrationSetBuilder {
        MigrationSetBuilder::default()
    }

    /// Look up a migration by exact version.
    pub fn find(&self, version: &str) -> Option<&Migration> {
        self.migrations
            .binary_search_by(|m| m.version.as_str().cmp(version))
            .ok()
            .map(|idx| &self.migrations[idx])
    }

    /// All versions, ascending.
    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.migrations.iter().map(|m| m.version.as_str())
    }

    /// Iterate migrations in ascending version order.
    pub fn iter(&self) -> impl Iterator<Item = &Migration> {
        self.migrations.iter()
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}

/// Accumulates migration files, rejecting bad names and duplicate versions.
#[derive(Debug, Default)]
pub struct MigrationSetBuilder {
    // version -> (origin, body)
    entries: BTreeMap<String, (String, Vec<u8>)>,
}

impl MigrationSetBuilder {
    /// Add a file by name. `origin` is used in error messages only.
    pub fn add(
        &mut self,
        file_name: &str,
        origin: &str,
        body: Vec<u8>,
    ) -> Result<&mut Self, SourceLoadError> {
        let version = parse_version(file_name).ok_or_else(|| SourceLoadError::MalformedName {
            name: file_name.to_string(),
            path: origin.to_string(),
        })?;

        match self.entries.entry(version.to_string()) {
            Entry::Occupied(existing) => {
                return Err(SourceLoadError::DuplicateVersion {
                    version: version.to_string(),
                    first: existing.get().0.clone(),
                    second: origin.to_string(),
                });
            }
            Entry::Vacant(slot) => {
                slot.insert((origin.to_string(), body));
            }
        }
        Ok(self)
    }

    /// Finish, producing a set ordered by version.
    pub fn build(self) -> MigrationSet {
        let migrations = self
            .entries
            .into_iter()
            .map(|(version, (_, body))| Migration { version, body })
            .collect();
        MigrationSet { migrations }
    }
}

#[cfg(test)]
#[path = "migration_test.rs"]
mod tests;
