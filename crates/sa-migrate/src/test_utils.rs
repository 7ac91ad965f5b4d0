//! Shared test utilities for sa-migrate

use crate::observer::{MigrationObserver, MigrationOutcome};
use crate::source::StaticSource;
use crate::Engine;
use sa_core::Namespace;
use sa_db::{ConnectionFactory, Database, DuckDbConnector};
use std::sync::{Arc, Mutex};

/// The two-step users scenario
pub(crate) static USERS: &[(&str, &str)] = &[
    ("001_create_users.sql", "create table users(id int);"),
    ("002_add_email.sql", "alter table users add column email text;"),
];

/// Shorthand for a valid namespace
pub(crate) fn ns(name: &str) -> Namespace {
    Namespace::try_new(name).unwrap()
}

/// Build an engine on a fresh session of `connector`
pub(crate) async fn engine_for(
    connector: &DuckDbConnector,
    namespace: &str,
    files: &'static [(&'static str, &'static str)],
) -> Engine {
    let namespace = ns(namespace);
    let db = connector.connect(&namespace).await.unwrap();
    Engine::new(db, namespace, Arc::new(StaticSource::new(files)))
}

/// Column names of `schema.table`, in ordinal order
pub(crate) async fn columns(db: &dyn Database, schema: &str, table: &str) -> Vec<String> {
    db.query_strings(&format!(
        "select column_name from information_schema.columns \
         where table_schema = '{schema}' and table_name = '{table}' order by ordinal_position"
    ))
    .await
    .unwrap()
}

/// Versions recorded in `schema._migrations`
pub(crate) async fn tracked(db: &dyn Database, schema: &str) -> Vec<String> {
    db.query_strings(&format!(
        "select version from \"{schema}\".\"_migrations\" order by version"
    ))
    .await
    .unwrap()
}

/// Observer that remembers every event as `(namespace, version, outcome)`
#[derive(Default)]
pub(crate) struct RecordingObserver {
    pub(crate) started: Mutex<Vec<String>>,
    pub(crate) events: Mutex<Vec<(String, String, MigrationOutcome)>>,
}

impl RecordingObserver {
    pub(crate) fn events(&self) -> Vec<(String, String, MigrationOutcome)> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }
}

impl MigrationObserver for RecordingObserver {
    fn on_namespace_start(&self, namespace: &Namespace) {
        self.started.lock().unwrap().push(namespace.to_string());
    }

    fn on_migration(&self, namespace: &Namespace, version: &str, outcome: &MigrationOutcome) {
        self.events.lock().unwrap().push((
            namespace.to_string(),
            version.to_string(),
            outcome.clone(),
        ));
    }
}
