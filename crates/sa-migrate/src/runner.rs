//! Drives an [`Engine`] across one or more namespaces.

use crate::cancel::CancelSignal;
use crate::engine::Engine;
use crate::error::{MigrateError, MigrateResult};
use crate::migration::MigrationSet;
use crate::observer::MigrationObserver;
use crate::source::MigrationSource;
use crate::state::StateStore;
use sa_core::Namespace;
use sa_db::ConnectionFactory;
use serde::Serialize;
use std::sync::Arc;

/// Settings for one [`Runner`] invocation.
#[derive(Debug, Clone, Default)]
pub struct RunnerOptions {
    /// Namespaces in processing order. Empty means the implicit default.
    pub namespaces: Vec<Namespace>,
    /// Run each namespace in one transaction and roll it back
    pub dry_run: bool,
    /// Version of the application being migrated, for reporting
    pub app_version: String,
}

/// What happened in one namespace.
#[derive(Debug)]
pub struct NamespaceReport {
    pub namespace: Namespace,
    /// Versions that succeeded, in order (rolled back again in dry run)
    pub applied: Vec<String>,
    /// The error that stopped this namespace, if any
    pub error: Option<MigrateError>,
}

impl NamespaceReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of a whole [`Runner::run`].
#[derive(Debug)]
pub struct RunReport {
    pub app_version: String,
    pub dry_run: bool,
    /// Stopped by the cancel signal before every namespace was processed
    pub cancelled: bool,
    pub namespaces: Vec<NamespaceReport>,
}

impl RunReport {
    /// True when every namespace was processed and finished without error.
    pub fn is_success(&self) -> bool {
        !self.cancelled && self.namespaces.iter().all(NamespaceReport::is_success)
    }

    /// Namespaces that stopped on an error.
    pub fn failures(&self) -> impl Iterator<Item = &NamespaceReport> {
        self.namespaces.iter().filter(|r| !r.is_success())
    }

    /// Total number of migrations that succeeded across namespaces.
    pub fn applied_count(&self) -> usize {
        self.namespaces.iter().map(|r| r.applied.len()).sum()
    }
}

/// Applied and pending versions of one namespace.
#[derive(Debug, Clone, Serialize)]
pub struct NamespaceStatus {
    pub namespace: String,
    pub applied: Vec<String>,
    pub pending: Vec<String>,
}

/// Runs migrations for every configured namespace, one after another.
///
/// Every namespace's migration set is loaded before any database access,
/// then each namespace runs on a fresh session. A failure stops its own
/// namespace only; namespaces already migrated stay migrated.
pub struct Runner {
    factory: Arc<dyn ConnectionFactory>,
    source: Arc<dyn MigrationSource>,
    options: RunnerOptions,
    cancel: CancelSignal,
}

impl Runner {
    pub fn new(
        factory: Arc<dyn ConnectionFactory>,
        source: Arc<dyn MigrationSource>,
        options: RunnerOptions,
    ) -> Self {
        Self {
            factory,
            source,
            options,
            cancel: CancelSignal::new(),
        }
    }

    /// Use a caller-owned cancellation signal.
    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    /// Namespaces in the order they will be processed.
    pub fn namespaces(&self) -> Vec<Namespace> {
        if self.options.namespaces.is_empty() {
            vec![Namespace::default()]
        } else {
            self.options.namespaces.clone()
        }
    }

    /// Migrate every namespace.
    ///
    /// Returns `Err` only when the source itself cannot be loaded; failures
    /// inside a namespace are collected in the report.
    pub async fn run(&self, observer: &dyn MigrationObserver) -> MigrateResult<RunReport> {
        let sets = self.load_sets()?;
        log::info!(
            "Migrating {} (app version {}){}",
            self.source.describe(),
            self.options.app_version,
            if self.options.dry_run { " [dry run]" } else { "" }
        );

        let mut reports = Vec::new();
        let mut cancelled = false;
        for (namespace, set) in sets {
            if self.cancel.is_cancelled() {
                log::warn!("Cancelled before namespace '{}'", namespace);
                cancelled = true;
                break;
            }
            observer.on_namespace_start(&namespace);
            let report = self.run_namespace(namespace, set, observer).await;
            if let Some(err) = &report.error {
                log::warn!("Namespace '{}' failed: {err}", report.namespace);
            }
            reports.push(report);
        }

        Ok(RunReport {
            app_version: self.options.app_version.clone(),
            dry_run: self.options.dry_run,
            cancelled,
            namespaces: reports,
        })
    }

    /// Report applied and pending versions per namespace.
    ///
    /// Read-only: no schema or tracking table is created, and a namespace
    /// never migrated reports everything as pending.
    pub async fn status(&self) -> MigrateResult<Vec<NamespaceStatus>> {
        let sets = self.load_sets()?;
        let db = self.factory.inspect().await.map_err(|e| {
            MigrateError::Configuration(format!("cannot open database: {e}"))
        })?;

        let mut statuses = Vec::with_capacity(sets.len());
        for (namespace, set) in sets {
            let applied = StateStore::new(Arc::clone(&db), &namespace)
                .read_applied()
                .await?;
            statuses.push(NamespaceStatus {
                namespace: namespace.to_string(),
                applied: applied.versions().map(String::from).collect(),
                pending: applied.pending_in(&set),
            });
        }
        Ok(statuses)
    }

    /// Load the migration set of every namespace, failing on the first
    /// source error.
    fn load_sets(&self) -> MigrateResult<Vec<(Namespace, Arc<MigrationSet>)>> {
        self.namespaces()
            .into_iter()
            .map(|namespace| -> MigrateResult<_> {
                let set = self.source.load_for(&namespace)?;
                Ok((namespace, Arc::new(set)))
            })
            .collect()
    }

    async fn engine(
        &self,
        namespace: &Namespace,
        set: Arc<MigrationSet>,
    ) -> MigrateResult<Engine> {
        let db = self.factory.connect(namespace).await.map_err(|e| {
            MigrateError::Configuration(format!("cannot open namespace '{namespace}': {e}"))
        })?;
        Ok(Engine::new(db, namespace.clone(), set)
            .with_dry_run(self.options.dry_run)
            .with_cancel(self.cancel.clone()))
    }

    async fn run_namespace(
        &self,
        namespace: Namespace,
        set: Arc<MigrationSet>,
        observer: &dyn MigrationObserver,
    ) -> NamespaceReport {
        log::info!("Namespace '{}'", namespace);

        let mut engine = match self.engine(&namespace, set).await {
            Ok(engine) => engine,
            Err(err) => {
                return NamespaceReport {
                    namespace,
                    applied: Vec::new(),
                    error: Some(err),
                }
            }
        };

        let result = match engine.initialize().await {
            Ok(()) => engine.run(observer).await.map(|_| ()),
            Err(err) => Err(err),
        };

        NamespaceReport {
            namespace,
            applied: engine.completed().to_vec(),
            error: result.err(),
        }
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
