//! CLI command implementations

pub(crate) mod common;
pub(crate) mod migrate;
pub(crate) mod migration;
pub(crate) mod status;
