//! The book record stored by every backend.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// A book record.
///
/// Identical in shape on every backend. The `id` is assigned once at insert
/// time and the same value is written to every tier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier, a version 4 UUID string.
    pub id: String,
    /// Book title.
    pub title: String,
    /// Book author.
    pub author: String,
}

impl Record {
    /// Creates a record with an explicit id.
    pub fn new(id: impl Into<String>, title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: author.into(),
        }
    }

    /// Creates a record from caller input, generating a fresh id.
    pub fn from_input(input: InsertInput) -> Self {
        Self {
            id: generate_id(),
            title: input.title,
            author: input.author,
        }
    }

    /// Checks that every field is non-empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::MissingRequiredField {
                field: "id".to_string(),
            });
        }
        InsertInput::new(self.title.as_str(), self.author.as_str()).validate()
    }
}

/// Caller-supplied fields for a new record. The id is never supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertInput {
    pub title: String,
    pub author: String,
}

impl InsertInput {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
        }
    }

    /// Rejects empty titles and authors.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingRequiredField {
                field: "title".to_string(),
            });
        }
        if self.author.trim().is_empty() {
            return Err(ValidationError::MissingRequiredField {
                field: "author".to_string(),
            });
        }
        Ok(())
    }
}

/// Generates a new record id.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
