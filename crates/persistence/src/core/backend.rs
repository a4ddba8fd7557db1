//! Backend identification.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Identifies the type of storage backend.
///
/// Used for diagnostics, status reports and registry dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// In-process map, always available.
    Memory,
    /// PostgreSQL table store.
    Postgres,
    /// MongoDB document store.
    #[serde(rename = "mongodb")]
    MongoDB,
    /// The dual-write orchestrator wrapping other backends.
    DualWrite,
}

impl BackendKind {
    /// Names accepted by [`FromStr`], for error messages.
    pub const ACCEPTED_NAMES: &'static str =
        "memory, mem, in-memory, postgres, postgresql, relational, sql, mongodb, mongo, document, firestore";

    /// The cargo feature that compiles this backend in, if any.
    pub fn feature(&self) -> Option<&'static str> {
        match self {
            BackendKind::Postgres => Some("postgres"),
            BackendKind::MongoDB => Some("mongodb"),
            BackendKind::Memory | BackendKind::DualWrite => None,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Memory => write!(f, "memory"),
            BackendKind::Postgres => write!(f, "postgres"),
            BackendKind::MongoDB => write!(f, "mongodb"),
            BackendKind::DualWrite => write!(f, "dual-write"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    /// Parses a configured backend name. The orchestrator is not selectable
    /// by name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" | "in-memory" => Ok(BackendKind::Memory),
            "postgres" | "postgresql" | "relational" | "sql" => Ok(BackendKind::Postgres),
            "mongodb" | "mongo" | "document" | "firestore" => Ok(BackendKind::MongoDB),
            _ => Err(ConfigError::UnknownBackend {
                name: s.to_string(),
                expected: Self::ACCEPTED_NAMES.to_string(),
            }),
        }
    }
}
