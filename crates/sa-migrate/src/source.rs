//! Migration sources: where migration scripts are read from.

use crate::error::SourceLoadError;
use crate::migration::MigrationSet;
use sa_core::Namespace;
use std::path::{Component, Path, PathBuf};

/// Something that can produce a [`MigrationSet`].
///
/// Loading has no side effects; calling it twice yields equal sets as long
/// as the underlying files are unchanged.
pub trait MigrationSource: Send + Sync {
    /// Read every migration and return them ordered by version
    fn load(&self) -> Result<MigrationSet, SourceLoadError>;

    /// Migrations for one namespace. Sources without per-namespace scripts
    /// return the shared set.
    fn load_for(&self, _namespace: &Namespace) -> Result<MigrationSet, SourceLoadError> {
        self.load()
    }

    /// Human-readable location, for logs
    fn describe(&self) -> String;
}

/// Migration scripts stored in a directory on disk.
///
/// Only files directly inside a directory are migrations; the version comes
/// from the file name. A subdirectory named after a namespace holds that
/// namespace's own scripts and replaces the shared top-level set for it.
/// Other subdirectories are ignored.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory read for `namespace`: `<root>/<namespace>` if it exists,
    /// otherwise the root itself.
    pub fn dir_for(&self, namespace: &Namespace) -> PathBuf {
        let mut components = Path::new(namespace.as_str()).components();
        if let (Some(Component::Normal(_)), None) = (components.next(), components.next()) {
            let own = self.root.join(namespace.as_str());
            if own.is_dir() {
                return own;
            }
        }
        self.root.clone()
    }

    fn load_dir(dir: &Path) -> Result<MigrationSet, SourceLoadError> {
        let io_err = |path: &Path, source| SourceLoadError::Io {
            path: path.display().to_string(),
            source,
        };

        let mut builder = MigrationSet::builder();
        let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;

        for entry in entries {
            let entry = entry.map_err(|e| io_err(dir, e))?;
            let path = entry.path();

            // file_type() does not follow symlinks
            let file_type = entry.file_type().map_err(|e| io_err(&path, e))?;
            if file_type.is_dir() {
                log::debug!("Skipping directory {}", path.display());
                continue;
            }
            if !path.is_file() {
                log::debug!("Skipping non-regular file {}", path.display());
                continue;
            }

            let origin = path.display().to_string();
            let raw_name = entry.file_name();
            let file_name = raw_name
                .to_str()
                .ok_or_else(|| SourceLoadError::MalformedName {
                    name: raw_name.to_string_lossy().into_owned(),
                    path: origin.clone(),
                })?;
            let body = std::fs::read(&path).map_err(|e| io_err(&path, e))?;
            builder.add(file_name, &origin, body)?;
        }

        let set = builder.build();
        log::debug!("Loaded {} migrations from {}", set.len(), dir.display());
        Ok(set)
    }
}

impl MigrationSource for DirSource {
    fn load(&self) -> Result<MigrationSet, SourceLoadError> {
        Self::load_dir(&self.root)
    }

    fn load_for(&self, namespace: &Namespace) -> Result<MigrationSet, SourceLoadError> {
        Self::load_dir(&self.dir_for(namespace))
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// Migration scripts compiled into the binary, as `(file_name, body)` pairs.
///
/// ```
/// use sa_migrate::StaticSource;
///
/// static MIGRATIONS: &[(&str, &str)] = &[
///     ("001_create_users.sql", "create table users(id int);"),
/// ];
/// let source = StaticSource::new(MIGRATIONS);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct StaticSource {
    files: &'static [(&'static str, &'static str)],
}

impl StaticSource {
    pub const fn new(files: &'static [(&'static str, &'static str)]) -> Self {
        Self { files }
    }
}

impl MigrationSource for StaticSource {
    fn load(&self) -> Result<MigrationSet, SourceLoadError> {
        let mut builder = MigrationSet::builder();
        for (name, body) in self.files {
            builder.add(name, name, body.as_bytes().to_vec())?;
        }
        Ok(builder.build())
    }

    fn describe(&self) -> String {
        format!("<embedded: {} files>", self.files.len())
    }
}

/// An already-loaded set replays itself, so one load can serve many
/// namespaces.
impl MigrationSource for MigrationSet {
    fn load(&self) -> Result<MigrationSet, SourceLoadError> {
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        format!("<loaded: {} migrations>", self.len())
    }
}

#[cfg(test)]
#[path = "source_test.rs"]
mod tests;
