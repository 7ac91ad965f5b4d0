//! DuckDB database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::{ConnectionFactory, Database};
use async_trait::async_trait;
use duckdb::Connection;
use sa_core::Namespace;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// DuckDB database backend
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    /// Open another session on the same database.
    ///
    /// The new session starts with default settings; nothing set on `self`
    /// carries over.
    pub fn try_clone(&self) -> DbResult<Self> {
        let conn = self.lock()?;
        let cloned = conn
            .try_clone()
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(cloned),
        })
    }

    /// Create `namespace` if needed and make it this session's default schema
    pub fn use_namespace(&self, namespace: &Namespace) -> DbResult<()> {
        let sql = format!(
            "CREATE SCHEMA IF NOT EXISTS {}; SET schema = '{}';",
            namespace.quoted(),
            namespace.as_str()
        );
        self.execute_batch_sync(&sql)
            .map_err(|e| DbError::ConnectionError(format!("namespace '{namespace}': {e}")))
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    /// Execute parameterized SQL synchronously
    fn execute_with_params_sync(&self, sql: &str, params: &[&str]) -> DbResult<usize> {
        let conn = self.lock()?;
        conn.execute(sql, duckdb::params_from_iter(params.iter()))
            .map_err(DbError::from)
    }

    /// Execute batch SQL synchronously
    fn execute_batch_sync(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql).map_err(DbError::from)
    }

    /// Collect the first column of a query synchronously
    fn query_strings_sync(&self, sql: &str) -> DbResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let values = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(values)
    }

    /// Check if relation exists synchronously
    fn relation_exists_sync(&self, name: &str) -> DbResult<bool> {
        let conn = self.lock()?;

        // Handle schema-qualified names
        let (schema, table) = match name.rfind('.') {
            Some(pos) => (&name[..pos], &name[pos + 1..]),
            None => ("main", name),
        };

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = ? AND table_name = ?",
                duckdb::params![schema, table],
                |row| row.get(0),
            )
            .map_err(|e| DbError::ExecutionError(e.to_string()))?;

        Ok(count > 0)
    }

    fn transaction_sync(&self, stmt: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(stmt)
            .map_err(|e| DbError::TransactionError(format!("{stmt} failed: {e}")))
    }
}

#[async_trait]
impl Database for DuckDbBackend {
    async fn execute_with_params(&self, sql: &str, params: &[&str]) -> DbResult<usize> {
        self.execute_with_params_sync(sql, params)
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.execute_batch_sync(sql)
    }

    async fn query_strings(&self, sql: &str) -> DbResult<Vec<String>> {
        self.query_strings_sync(sql)
    }

    async fn relation_exists(&self, name: &str) -> DbResult<bool> {
        self.relation_exists_sync(name)
    }

    async fn begin(&self) -> DbResult<()> {
        self.transaction_sync("BEGIN TRANSACTION")
    }

    async fn commit(&self) -> DbResult<()> {
        self.transaction_sync("COMMIT")
    }

    async fn rollback(&self) -> DbResult<()> {
        self.transaction_sync("ROLLBACK")
    }
}

/// [`ConnectionFactory`] over a single DuckDB database.
///
/// Keeps one root session open (so `:memory:` databases survive between
/// namespaces) and clones a fresh session from it for every namespace.
pub struct DuckDbConnector {
    root: DuckDbBackend,
}

impl DuckDbConnector {
    /// Open the database at `path` (or `:memory:`)
    pub fn new(path: &str) -> DbResult<Self> {
        Ok(Self {
            root: DuckDbBackend::new(path)?,
        })
    }

    /// The root session, for inspecting the database outside any namespace
    pub fn root(&self) -> &DuckDbBackend {
        &self.root
    }
}

#[async_trait]
impl ConnectionFactory for DuckDbConnector {
    async fn connect(&self, namespace: &Namespace) -> DbResult<Arc<dyn Database>> {
        log::debug!("Opening session for namespace '{}'", namespace);
        let session = self.root.try_clone()?;
        session.use_namespace(namespace)?;
        Ok(Arc::new(session))
    }

    async fn inspect(&self) -> DbResult<Arc<dyn Database>> {
        Ok(Arc::new(self.root.try_clone()?))
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
