//! Migration engine for a single namespace.
//!
//! An [`Engine`] owns one database session. [`Engine::initialize`] snapshots
//! the migration set and the applied state; [`Engine::pending`] diffs the two;
//! [`Engine::migrate`] applies one version in a transaction that also inserts
//! its tracking row, so a version is either fully applied or not at all.
//! A dry [`Engine::run`] executes every pending version inside one
//! transaction and rolls it back at the end, so later scripts see the
//! effects of earlier ones exactly as a real run would.

use crate::cancel::CancelSignal;
use crate::error::{MigrateError, MigrateResult};
use crate::migration::{Migration, MigrationSet};
use crate::observer::{MigrationObserver, MigrationOutcome};
use crate::source::MigrationSource;
use crate::state::{AppliedState, StateStore};
use sa_core::Namespace;
use sa_db::{Database, DbError};
use std::sync::Arc;

/// Lifecycle of an [`Engine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineState {
    /// `initialize()` has not succeeded yet
    Uninitialized,
    /// Snapshots loaded, nothing attempted
    Initialized,
    /// Last migration succeeded; ready for the next
    Idle,
    /// Inside the transaction for this version
    Applying(String),
    /// This version failed and was rolled back
    Failed(String),
    /// `run()` applied every pending migration
    Completed,
}

/// Snapshots taken by `initialize()`.
struct Loaded {
    migrations: MigrationSet,
    applied: AppliedState,
}

/// Applies migrations to one namespace over one session.
///
/// Methods take `&mut self`: one engine serves one logical writer.
pub struct Engine {
    db: Arc<dyn Database>,
    namespace: Namespace,
    source: Arc<dyn MigrationSource>,
    store: StateStore,
    dry_run: bool,
    cancel: CancelSignal,
    loaded: Option<Loaded>,
    completed: Vec<String>,
    state: EngineState,
}

impl Engine {
    /// Create an engine. `db` must already be bound to `namespace`.
    pub fn new(
        db: Arc<dyn Database>,
        namespace: Namespace,
        source: Arc<dyn MigrationSource>,
    ) -> Self {
        let store = StateStore::new(Arc::clone(&db), &namespace);
        Self {
            db,
            namespace,
            source,
            store,
            dry_run: false,
            cancel: CancelSignal::new(),
            loaded: None,
            completed: Vec::new(),
            state: EngineState::Uninitialized,
        }
    }

    /// Roll back every migration after executing it.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Use a caller-owned cancellation signal.
    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Versions this engine migrated successfully, in order. In dry run these
    /// were rolled back again.
    pub fn completed(&self) -> &[String] {
        &self.completed
    }

    /// Versions committed in this namespace, as of `initialize()` plus any
    /// committed since.
    pub fn applied(&self) -> MigrateResult<&AppliedState> {
        Ok(&self.loaded()?.applied)
    }

    /// Create the tracking table, then load the migration set and the
    /// applied state.
    pub async fn initialize(&mut self) -> MigrateResult<()> {
        self.store.ensure_tracking_table().await?;
        let migrations = self.source.load_for(&self.namespace)?;
        let applied = self.store.load_applied().await?;

        log::debug!(
            "Namespace '{}': {} migrations in {}, {} applied",
            self.namespace,
            migrations.len(),
            self.source.describe(),
            applied.len()
        );

        self.loaded = Some(Loaded {
            migrations,
            applied,
        });
        self.state = EngineState::Initialized;
        Ok(())
    }

    /// Versions in the migration set that are not applied yet, ascending.
    pub fn pending(&self) -> MigrateResult<Vec<String>> {
        let loaded = self.loaded()?;
        Ok(loaded.applied.pending_in(&loaded.migrations))
    }

    /// Apply one migration.
    ///
    /// The tracking insert and the script body share one transaction. In dry
    /// run that transaction is always rolled back, so this previews a single
    /// version against the current committed state.
    pub async fn migrate(&mut self, version: &str) -> MigrateResult<()> {
        let migration = self
            .loaded()?
            .migrations
            .find(version)
            .cloned()
            .ok_or_else(|| MigrateError::NotFound(version.to_string()))?;

        self.check_cancelled(version)?;
        self.state = EngineState::Applying(version.to_string());

        match self.apply(&migration).await {
            Ok(()) => {
                if !self.dry_run {
                    if let Some(loaded) = self.loaded.as_mut() {
                        loaded.applied.insert(version);
                    }
                }
                log::debug!(
                    "Namespace '{}': {} {}",
                    self.namespace,
                    version,
                    if self.dry_run { "ok (rolled back)" } else { "committed" }
                );
                self.completed.push(version.to_string());
                self.state = EngineState::Idle;
                Ok(())
            }
            Err(err) => {
                self.state = EngineState::Failed(version.to_string());
                Err(err)
            }
        }
    }

    /// Apply every pending migration in order, stopping at the first failure.
    ///
    /// Returns the versions that succeeded. Versions committed before a
    /// failure stay committed. In dry run nothing is committed, and the
    /// result matches what a real run would return.
    pub async fn run(&mut self, observer: &dyn MigrationObserver) -> MigrateResult<Vec<String>> {
        if self.dry_run {
            return self.run_dry(observer).await;
        }

        let pending = self.pending()?;
        let mut done = Vec::with_capacity(pending.len());

        for version in pending {
            match self.migrate(&version).await {
                Ok(()) => {
                    observer.on_migration(&self.namespace, &version, &MigrationOutcome::Applied);
                    done.push(version);
                }
                Err(err) => {
                    let outcome = MigrationOutcome::Failed(err.to_string());
                    observer.on_migration(&self.namespace, &version, &outcome);
                    return Err(err);
                }
            }
        }

        self.state = EngineState::Completed;
        Ok(done)
    }

    async fn run_dry(&mut self, observer: &dyn MigrationObserver) -> MigrateResult<Vec<String>> {
        let pending: Vec<Migration> = {
            let loaded = self.loaded()?;
            loaded
                .migrations
                .iter()
                .filter(|m| !loaded.applied.contains(&m.version))
                .cloned()
                .collect()
        };
        let Some(first) = pending.first() else {
            self.state = EngineState::Completed;
            return Ok(Vec::new());
        };

        self.check_cancelled(&first.version)?;
        self.db
            .begin()
            .await
            .map_err(|e| MigrateError::execution(&first.version, e))?;

        let mut done = Vec::with_capacity(pending.len());
        let mut result = Ok(());
        for migration in &pending {
            let version = migration.version.as_str();
            self.state = EngineState::Applying(version.to_string());

            match self.apply_in_transaction(migration).await {
                Ok(()) => {
                    observer.on_migration(&self.namespace, version, &MigrationOutcome::DryRun);
                    self.completed.push(version.to_string());
                    done.push(version.to_string());
                }
                Err(err) => {
                    let outcome = MigrationOutcome::Failed(err.to_string());
                    observer.on_migration(&self.namespace, version, &outcome);
                    self.state = EngineState::Failed(version.to_string());
                    result = Err(err);
                    break;
                }
            }
        }

        if let Err(e) = self.db.rollback().await {
            log::warn!(
                "Namespace '{}': rollback of dry run failed: {e}",
                self.namespace
            );
        }
        result?;

        log::debug!(
            "Namespace '{}': dry run of {} migrations rolled back",
            self.namespace,
            done.len()
        );
        self.state = EngineState::Completed;
        Ok(done)
    }

    fn loaded(&self) -> MigrateResult<&Loaded> {
        self.loaded.as_ref().ok_or(MigrateError::NotInitialized)
    }

    fn check_cancelled(&self, version: &str) -> MigrateResult<()> {
        if self.cancel.is_cancelled() {
            return Err(MigrateError::Cancelled {
                version: version.to_string(),
            });
        }
        Ok(())
    }

    async fn apply(&self, migration: &Migration) -> MigrateResult<()> {
        let version = migration.version.as_str();

        self.db
            .begin()
            .await
            .map_err(|e| MigrateError::execution(version, e))?;

        let result = self.apply_in_transaction(migration).await;

        if self.dry_run || result.is_err() {
            if let Err(e) = self.db.rollback().await {
                log::warn!(
                    "Namespace '{}': rollback of {} failed: {e}",
                    self.namespace,
                    version
                );
            }
            return result;
        }

        if let Err(e) = self.db.commit().await {
            if let Err(rollback) = self.db.rollback().await {
                log::warn!(
                    "Namespace '{}': rollback after failed commit of {} failed: {rollback}",
                    self.namespace,
                    version
                );
            }
            return Err(MigrateError::execution(version, e));
        }
        Ok(())
    }

    async fn apply_in_transaction(&self, migration: &Migration) -> MigrateResult<()> {
        let version = migration.version.as_str();
        self.check_cancelled(version)?;

        self.store
            .record(version)
            .await
            .map_err(|e| MigrateError::execution(version, e))?;

        self.check_cancelled(version)?;

        let body = std::str::from_utf8(&migration.body).map_err(|e| {
            MigrateError::execution(
                version,
                DbError::ExecutionError(format!("script is not valid UTF-8: {e}")),
            )
        })?;
        if !body.trim().is_empty() {
            self.db
                .execute_batch(body)
                .await
                .map_err(|e| MigrateError::execution(version, e))?;
        }

        self.check_cancelled(version)
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
