use super::*;
use crate::observer::{MigrationOutcome, NoopObserver};
use crate::source::{DirSource, StaticSource};
use crate::test_utils::{columns, ns, tracked, RecordingObserver, USERS};
use sa_db::{Database, DuckDbConnector};

fn runner(connector: &Arc<DuckDbConnector>, namespaces: &[&str], dry_run: bool) -> Runner {
    Runner::new(
        Arc::clone(connector) as Arc<dyn ConnectionFactory>,
        Arc::new(StaticSource::new(USERS)),
        RunnerOptions {
            namespaces: namespaces.iter().map(|n| ns(n)).collect(),
            dry_run,
            app_version: "1.0.0".to_string(),
        },
    )
}

fn connector() -> Arc<DuckDbConnector> {
    Arc::new(DuckDbConnector::new(":memory:").unwrap())
}

/// Every schema and table the catalog knows about
async fn catalog(db: &dyn Database) -> Vec<String> {
    let mut names = db
        .query_strings("select schema_name from information_schema.schemata order by 1")
        .await
        .unwrap();
    names.extend(
        db.query_strings(
            "select table_schema || '.' || table_name from information_schema.tables order by 1",
        )
        .await
        .unwrap(),
    );
    names
}

#[tokio::test]
async fn test_default_namespace_when_none_configured() {
    let connector = connector();
    let runner = runner(&connector, &[], false);
    assert_eq!(runner.namespaces(), vec![Namespace::default()]);

    let report = runner.run(&NoopObserver).await.unwrap();
    assert!(report.is_success());
    assert!(!report.cancelled);
    assert_eq!(report.namespaces.len(), 1);
    assert_eq!(report.namespaces[0].namespace.as_str(), "main");
    assert_eq!(report.applied_count(), 2);
    assert_eq!(report.app_version, "1.0.0");
    assert_eq!(
        tracked(connector.root(), "main").await,
        vec!["001_create_users", "002_add_email"]
    );
}

#[tokio::test]
async fn test_namespaces_are_migrated_independently() {
    let connector = connector();
    let observer = RecordingObserver::default();
    let report = runner(&connector, &["alpha", "beta"], false)
        .run(&observer)
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.applied_count(), 4);
    assert_eq!(observer.started(), vec!["alpha", "beta"]);

    let root = connector.root();
    for schema in ["alpha", "beta"] {
        assert_eq!(columns(root, schema, "users").await, vec!["id", "email"]);
        assert_eq!(
            tracked(root, schema).await,
            vec!["001_create_users", "002_add_email"]
        );
    }
    assert!(!root.relation_exists("main.users").await.unwrap());
}

#[tokio::test]
async fn test_failure_stops_only_its_namespace() {
    let connector = connector();
    connector
        .root()
        .execute_batch("create schema beta; create table beta.users(id int);")
        .await
        .unwrap();

    let observer = RecordingObserver::default();
    let report = runner(&connector, &["alpha", "beta", "gamma"], false)
        .run(&observer)
        .await
        .unwrap();

    assert!(!report.is_success());
    let failed: Vec<_> = report.failures().map(|r| r.namespace.to_string()).collect();
    assert_eq!(failed, vec!["beta"]);

    let beta = &report.namespaces[1];
    assert!(beta.applied.is_empty());
    assert!(matches!(
        beta.error,
        Some(MigrateError::Execution { ref version, .. }) if version == "001_create_users"
    ));

    // Namespaces before and after the failure are fully migrated
    let root = connector.root();
    assert_eq!(tracked(root, "alpha").await.len(), 2);
    assert_eq!(tracked(root, "gamma").await.len(), 2);
    assert!(tracked(root, "beta").await.is_empty());

    // Fail-fast within beta: 002 was never attempted
    let beta_events: Vec<_> = observer
        .events()
        .into_iter()
        .filter(|(n, _, _)| n == "beta")
        .collect();
    assert_eq!(beta_events.len(), 1);
    assert!(matches!(beta_events[0].2, MigrationOutcome::Failed(_)));
}

#[tokio::test]
async fn test_partial_progress_is_reported() {
    static BROKEN_SECOND: &[(&str, &str)] = &[
        ("001_create_users.sql", "create table users(id int);"),
        ("002_broken.sql", "alter table nope add column x int;"),
        ("003_add_email.sql", "alter table users add column email text;"),
    ];
    let connector = connector();
    let report = Runner::new(
        Arc::clone(&connector) as Arc<dyn ConnectionFactory>,
        Arc::new(StaticSource::new(BROKEN_SECOND)),
        RunnerOptions::default(),
    )
    .run(&NoopObserver)
    .await
    .unwrap();

    let main = &report.namespaces[0];
    assert_eq!(main.applied, vec!["001_create_users"]);
    assert!(!main.is_success());
    assert_eq!(tracked(connector.root(), "main").await, vec!["001_create_users"]);
}

#[tokio::test]
async fn test_source_errors_abort_before_database_access() {
    static BAD: &[(&str, &str)] = &[("no_delimiter", "select 1;")];
    let connector = connector();
    let observer = RecordingObserver::default();
    let err = Runner::new(
        Arc::clone(&connector) as Arc<dyn ConnectionFactory>,
        Arc::new(StaticSource::new(BAD)),
        RunnerOptions::default(),
    )
    .run(&observer)
    .await
    .unwrap_err();

    assert!(matches!(err, MigrateError::SourceLoad(_)));
    assert!(observer.started().is_empty());
    assert!(!connector
        .root()
        .relation_exists("main._migrations")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_dry_run_leaves_every_namespace_untouched() {
    let connector = connector();
    let observer = RecordingObserver::default();
    let report = runner(&connector, &["alpha", "beta"], true)
        .run(&observer)
        .await
        .unwrap();

    assert!(report.is_success());
    assert!(report.dry_run);
    assert_eq!(report.applied_count(), 4);
    assert!(observer
        .events()
        .iter()
        .all(|(_, _, outcome)| outcome == &MigrationOutcome::DryRun));

    let root = connector.root();
    for schema in ["alpha", "beta"] {
        assert!(tracked(root, schema).await.is_empty());
        assert!(!root
            .relation_exists(&format!("{schema}.users"))
            .await
            .unwrap());
    }
}

#[tokio::test]
async fn test_dry_run_succeeds_exactly_when_real_run_does() {
    let dry = runner(&connector(), &["alpha"], true)
        .run(&NoopObserver)
        .await
        .unwrap();
    let real = runner(&connector(), &["alpha"], false)
        .run(&NoopObserver)
        .await
        .unwrap();

    assert_eq!(dry.is_success(), real.is_success());
    assert!(dry.is_success());
    assert_eq!(dry.namespaces[0].applied, real.namespaces[0].applied);
}

#[tokio::test]
async fn test_namespace_folder_overrides_shared_scripts() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("001_create_users.sql"), "create table users(id int);")
        .unwrap();
    std::fs::create_dir(dir.path().join("billing")).unwrap();
    std::fs::write(
        dir.path().join("billing/001_create_invoices.sql"),
        "create table invoices(id int);",
    )
    .unwrap();

    let connector = connector();
    let report = Runner::new(
        Arc::clone(&connector) as Arc<dyn ConnectionFactory>,
        Arc::new(DirSource::new(dir.path())),
        RunnerOptions {
            namespaces: vec![ns("auth"), ns("billing")],
            ..RunnerOptions::default()
        },
    )
    .run(&NoopObserver)
    .await
    .unwrap();

    assert!(report.is_success());
    assert_eq!(report.namespaces[0].applied, vec!["001_create_users"]);
    assert_eq!(report.namespaces[1].applied, vec!["001_create_invoices"]);

    let root = connector.root();
    assert!(root.relation_exists("auth.users").await.unwrap());
    assert!(!root.relation_exists("auth.invoices").await.unwrap());
    assert!(root.relation_exists("billing.invoices").await.unwrap());
    assert!(!root.relation_exists("billing.users").await.unwrap());
}

#[tokio::test]
async fn test_second_run_is_a_no_op() {
    let connector = connector();
    let runner = runner(&connector, &["alpha"], false);
    runner.run(&NoopObserver).await.unwrap();

    let observer = RecordingObserver::default();
    let report = runner.run(&observer).await.unwrap();
    assert!(report.is_success());
    assert_eq!(report.applied_count(), 0);
    assert!(observer.events().is_empty());
    assert_eq!(observer.started(), vec!["alpha"]);
}

#[tokio::test]
async fn test_cancelled_runner_skips_remaining_namespaces() {
    let connector = connector();
    let cancel = CancelSignal::new();
    cancel.cancel();

    let observer = RecordingObserver::default();
    let report = runner(&connector, &["alpha", "beta"], false)
        .with_cancel(cancel)
        .run(&observer)
        .await
        .unwrap();

    assert!(report.cancelled);
    assert!(!report.is_success());
    assert!(report.namespaces.is_empty());
    assert!(observer.started().is_empty());
    assert!(!connector
        .root()
        .relation_exists("alpha._migrations")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_status_reports_applied_and_pending() {
    let connector = connector();
    runner(&connector, &["alpha"], false)
        .run(&NoopObserver)
        .await
        .unwrap();

    let statuses = runner(&connector, &["alpha", "beta"], false)
        .status()
        .await
        .unwrap();

    assert_eq!(statuses.len(), 2);
    assert_eq!(statuses[0].namespace, "alpha");
    assert_eq!(
        statuses[0].applied,
        vec!["001_create_users", "002_add_email"]
    );
    assert!(statuses[0].pending.is_empty());

    assert_eq!(statuses[1].namespace, "beta");
    assert!(statuses[1].applied.is_empty());
    assert_eq!(statuses[1].pending, vec!["001_create_users", "002_add_email"]);

    // status never applies anything
    assert!(!connector
        .root()
        .relation_exists("beta.users")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_status_creates_nothing() {
    let connector = connector();
    let before = catalog(connector.root()).await;

    let statuses = runner(&connector, &["alpha", "typo_namespace"], false)
        .status()
        .await
        .unwrap();

    assert_eq!(statuses.len(), 2);
    for status in &statuses {
        assert!(status.applied.is_empty());
        assert_eq!(status.pending, vec!["001_create_users", "002_add_email"]);
    }
    assert_eq!(catalog(connector.root()).await, before);
}

#[tokio::test]
async fn test_status_surfaces_source_errors() {
    static BAD: &[(&str, &str)] = &[("no_delimiter", "select 1;")];
    let connector = connector();
    let err = Runner::new(
        Arc::clone(&connector) as Arc<dyn ConnectionFactory>,
        Arc::new(StaticSource::new(BAD)),
        RunnerOptions::default(),
    )
    .status()
    .await
    .unwrap_err();

    assert!(matches!(err, MigrateError::SourceLoad(_)));
}
