//! sa-db - Database abstraction layer for stdapp
//!
//! This crate provides the `Database` trait the migration engine runs against,
//! a DuckDB implementation, and a connection factory that hands out one fresh
//! connection per namespace.

pub mod duckdb;
pub mod error;
pub mod traits;

pub use duckdb::{DuckDbBackend, DuckDbConnector};
pub use error::{DbError, DbResult};
pub use traits::{ConnectionFactory, Database};
