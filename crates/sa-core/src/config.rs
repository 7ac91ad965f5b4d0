//! Configuration types and parsing for stdapp.yml

use crate::error::{CoreError, CoreResult};
use crate::namespace::Namespace;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// File names tried by [`Config::load_from_dir`], in order.
pub const CONFIG_FILE_NAMES: &[&str] = &["stdapp.yml", "stdapp.yaml"];

/// Main project configuration from stdapp.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Project name
    pub name: String,

    /// Application version, handed to the migration runner for reporting
    #[serde(default = "default_version")]
    pub version: String,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Migration source and namespace configuration
    #[serde(default)]
    pub migrations: MigrationsConfig,
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// DuckDB file relative to the project root, or `:memory:`
    /// (nothing survives the process)
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Where migrations live and which namespaces they are applied to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationsConfig {
    /// Directory containing migration scripts, relative to the project root
    #[serde(default = "default_migrations_dir")]
    pub dir: String,

    /// Namespaces (schemas) to migrate, in order.
    ///
    /// Empty means the single implicit default namespace.
    #[serde(default)]
    pub domains: Vec<Namespace>,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            dir: default_migrations_dir(),
            domains: Vec::new(),
        }
    }
}

fn default_version() -> String {
    "1.0.0".to_string()
}

/// Path that selects a throwaway in-memory database.
pub const IN_MEMORY_DB: &str = ":memory:";

fn default_db_path() -> String {
    "db/app.duckdb".to_string()
}

fn default_migrations_dir() -> String {
    "db/migrate".to_string()
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        log::debug!("Loading config from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for stdapp.yml or stdapp.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        for name in CONFIG_FILE_NAMES {
            let path = dir.join(name);
            if path.exists() {
                return Self::load(&path);
            }
        }
        Err(CoreError::ConfigNotFound {
            path: dir.join(CONFIG_FILE_NAMES[0]).display().to_string(),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.name.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "Project name cannot be empty".to_string(),
            });
        }

        if self.migrations.dir.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "migrations.dir cannot be empty".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for domain in &self.migrations.domains {
            if !seen.insert(domain.as_str()) {
                return Err(CoreError::ConfigInvalid {
                    message: format!("Duplicate domain '{}' in migrations.domains", domain),
                });
            }
        }

        Ok(())
    }

    /// Namespaces to migrate, in configured order.
    ///
    /// Falls back to the implicit default namespace when none are configured.
    pub fn namespaces(&self) -> Vec<Namespace> {
        if self.migrations.domains.is_empty() {
            vec![Namespace::default()]
        } else {
            self.migrations.domains.clone()
        }
    }

    /// Absolute path of the migrations directory
    pub fn migrations_dir_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.migrations.dir)
    }

    /// Database path resolved against `root`, leaving `:memory:` untouched
    pub fn database_path_absolute(&self, root: &Path) -> String {
        if self.database.path == IN_MEMORY_DB {
            return self.database.path.clone();
        }
        let path = Path::new(&self.database.path);
        if path.is_absolute() {
            self.database.path.clone()
        } else {
            root.join(path).display().to_string()
        }
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
