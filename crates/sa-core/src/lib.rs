//! sa-core - Core library for stdapp
//!
//! This crate provides the project configuration (`stdapp.yml`), the
//! [`Namespace`] newtype used to partition a database into independently
//! migrated schemas, and the shared error type.

pub mod config;
pub mod error;
pub mod namespace;

pub use config::{Config, DatabaseConfig, MigrationsConfig};
pub use error::{CoreError, CoreResult};
pub use namespace::Namespace;
