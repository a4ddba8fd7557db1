//! Identifier safety for collection and table names.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationError;

static SAFE_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static identifier pattern"));

/// True when `name` starts with a letter or underscore and contains only
/// ASCII letters, digits and underscores.
pub fn is_safe_identifier(name: &str) -> bool {
    SAFE_IDENTIFIER.is_match(name)
}

/// A collection (or table) name that passed [`is_safe_identifier`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionName(String);

impl CollectionName {
    pub fn parse(name: &str) -> Result<Self, ValidationError> {
        if is_safe_identifier(name) {
            Ok(Self(name.to_string()))
        } else {
            Err(ValidationError::UnsafeIdentifier {
                name: name.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CollectionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
