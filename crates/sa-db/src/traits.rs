//! Database trait definitions

use crate::error::DbResult;
use async_trait::async_trait;
use sa_core::Namespace;
use std::sync::Arc;

/// Database abstraction trait for stdapp
///
/// One value wraps one session. Transaction control statements apply to that
/// session only, so callers must not interleave two units of work on it.
#[async_trait]
pub trait Database: Send + Sync {
    /// Execute a single SQL statement with positional string parameters
    async fn execute_with_params(&self, sql: &str, params: &[&str]) -> DbResult<usize>;

    /// Execute multiple SQL statements
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Run a query and collect its first column as strings
    async fn query_strings(&self, sql: &str) -> DbResult<Vec<String>>;

    /// Check if a table or view exists (optionally schema-qualified)
    async fn relation_exists(&self, name: &str) -> DbResult<bool>;

    /// Open a transaction on this session
    async fn begin(&self) -> DbResult<()>;

    /// Commit the open transaction
    async fn commit(&self) -> DbResult<()>;

    /// Roll back the open transaction
    async fn rollback(&self) -> DbResult<()>;
}

/// Hands out database sessions.
///
/// Every call returns a new session, so settings made for one namespace can
/// never leak into another.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    /// Open a session whose unqualified names resolve inside `namespace`,
    /// creating the namespace if it is missing
    async fn connect(&self, namespace: &Namespace) -> DbResult<Arc<dyn Database>>;

    /// Open a session that creates nothing and binds no namespace.
    /// Callers must use qualified names.
    async fn inspect(&self) -> DbResult<Arc<dyn Database>>;
}
