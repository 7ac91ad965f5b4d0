use super::*;
use crate::source::{MigrationSource, StaticSource};
use sa_db::{ConnectionFactory, DuckDbConnector};

async fn store_for(connector: &DuckDbConnector, namespace: &str) -> StateStore {
    let ns = Namespace::try_new(namespace).unwrap();
    let db = connector.connect(&ns).await.unwrap();
    StateStore::new(db, &ns)
}

#[tokio::test]
async fn test_ensure_tracking_table_is_idempotent() {
    let connector = DuckDbConnector::new(":memory:").unwrap();
    let store = store_for(&connector, "main").await;

    store.ensure_tracking_table().await.unwrap();
    store.ensure_tracking_table().await.unwrap();

    assert!(connector
        .root()
        .relation_exists("main._migrations")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_load_applied_empty() {
    let connector = DuckDbConnector::new(":memory:").unwrap();
    let store = store_for(&connector, "main").await;
    store.ensure_tracking_table().await.unwrap();

    let applied = store.load_applied().await.unwrap();
    assert!(applied.is_empty());
}

#[tokio::test]
async fn test_record_and_load() {
    let connector = DuckDbConnector::new(":memory:").unwrap();
    let store = store_for(&connector, "main").await;
    store.ensure_tracking_table().await.unwrap();

    store.record("002_b").await.unwrap();
    store.record("001_a").await.unwrap();

    let applied = store.load_applied().await.unwrap();
    assert_eq!(applied.len(), 2);
    assert!(applied.contains("001_a"));
    let versions: Vec<&str> = applied.versions().collect();
    assert_eq!(versions, vec!["001_a", "002_b"]);
}

#[tokio::test]
async fn test_record_duplicate_violates_unique() {
    let connector = DuckDbConnector::new(":memory:").unwrap();
    let store = store_for(&connector, "main").await;
    store.ensure_tracking_table().await.unwrap();

    store.record("001_a").await.unwrap();
    assert!(store.record("001_a").await.is_err());
}

#[tokio::test]
async fn test_load_without_table_is_configuration_error() {
    let connector = DuckDbConnector::new(":memory:").unwrap();
    let store = store_for(&connector, "main").await;

    let err = store.load_applied().await.unwrap_err();
    assert!(matches!(err, MigrateError::Configuration(_)));
}

#[tokio::test]
async fn test_tracking_tables_are_per_namespace() {
    let connector = DuckDbConnector::new(":memory:").unwrap();
    let billing = store_for(&connector, "billing").await;
    let auth = store_for(&connector, "auth").await;
    billing.ensure_tracking_table().await.unwrap();
    auth.ensure_tracking_table().await.unwrap();

    billing.record("001_a").await.unwrap();

    assert!(billing.load_applied().await.unwrap().contains("001_a"));
    assert!(auth.load_applied().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_read_applied_without_table_is_empty_and_creates_nothing() {
    let connector = DuckDbConnector::new(":memory:").unwrap();
    let session = connector.inspect().await.unwrap();
    let store = StateStore::new(session, &Namespace::try_new("billing").unwrap());

    assert!(store.read_applied().await.unwrap().is_empty());
    assert!(!connector
        .root()
        .relation_exists("billing._migrations")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_read_applied_sees_committed_versions() {
    let connector = DuckDbConnector::new(":memory:").unwrap();
    let writer = store_for(&connector, "billing").await;
    writer.ensure_tracking_table().await.unwrap();
    writer.record("001_a").await.unwrap();

    let session = connector.inspect().await.unwrap();
    let reader = StateStore::new(session, &Namespace::try_new("billing").unwrap());
    let applied = reader.read_applied().await.unwrap();
    assert_eq!(applied.versions().collect::<Vec<_>>(), vec!["001_a"]);
}

#[test]
fn test_pending_in_set() {
    static FILES: &[(&str, &str)] = &[("001_a.sql", ""), ("002_b.sql", ""), ("003_c.sql", "")];
    let set = StaticSource::new(FILES).load().unwrap();
    let applied: AppliedState = ["002_b".to_string()].into_iter().collect();

    assert_eq!(applied.pending_in(&set), vec!["001_a", "003_c"]);
}
