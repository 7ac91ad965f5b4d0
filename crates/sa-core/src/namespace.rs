//! Strongly-typed namespace (database schema) wrapper.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

/// Schema that unqualified objects land in when no namespace is configured.
pub const DEFAULT_NAMESPACE: &str = "main";

/// A schema partition of the database with its own migration tracking table.
///
/// The name is interpolated into identifiers and session settings, so it must
/// be non-empty and free of quote characters. Construction enforces both.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Namespace(String);

impl Namespace {
    /// Try to create a new `Namespace`, returning `None` for invalid names.
    pub fn try_new(name: impl Into<String>) -> Option<Self> {
        let s = name.into();
        if Self::is_valid(&s) {
            Some(Self(s))
        } else {
            None
        }
    }

    fn is_valid(s: &str) -> bool {
        !s.trim().is_empty() && !s.contains(['"', '\'', '\0'])
    }

    /// Return the underlying name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }


    /// The name as a double-quoted SQL identifier, e.g. `"billing"`.
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }

    /// Qualify `relation` with this namespace, quoting both parts.
    pub fn qualify(&self, relation: &str) -> String {
        format!("{}.\"{}\"", self.quoted(), relation)
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self(DEFAULT_NAMESPACE.to_string())
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Namespace {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for Namespace {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Namespace {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Namespace {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        if Self::is_valid(&s) {
            Ok(Self(s))
        } else {
            Err(format!(
                "invalid namespace '{s}': must be non-empty and contain no quote characters"
            ))
        }
    }
}

impl TryFrom<&str> for Namespace {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::try_from(s.to_string())
    }
}

impl From<Namespace> for String {
    fn from(ns: Namespace) -> Self {
        ns.0
    }
}

impl PartialEq<str> for Namespace {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Namespace {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
#[path = "namespace_test.rs"]
mod tests;
