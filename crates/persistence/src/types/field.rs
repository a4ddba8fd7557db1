//! Record field names accepted by queries and deletes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::Record;

/// One of the record's fields.
///
/// Field names arrive from callers as strings and are matched
/// case-insensitively against this closed set, so a parsed field is always
/// safe to splice into a query as a column name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordField {
    Id,
    Title,
    Author,
}

impl RecordField {
    pub const ALL: [RecordField; 3] = [RecordField::Id, RecordField::Title, RecordField::Author];

    /// Parses a caller-supplied field name, ignoring case and surrounding whitespace.
    pub fn parse(name: &str) -> Result<Self, ValidationError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "id" => Ok(RecordField::Id),
            "title" => Ok(RecordField::Title),
            "author" => Ok(RecordField::Author),
            _ => Err(ValidationError::UnsupportedField {
                field: name.to_string(),
            }),
        }
    }

    /// Canonical lower-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordField::Id => "id",
            RecordField::Title => "title",
            RecordField::Author => "author",
        }
    }

    /// The SQL column and document key this field is stored under.
    pub fn column(&self) -> &'static str {
        self.as_str()
    }

    /// Reads this field from a record.
    pub fn get<'a>(&self, record: &'a Record) -> &'a str {
        match self {
            RecordField::Id => &record.id,
            RecordField::Title => &record.title,
            RecordField::Author => &record.author,
        }
    }

    /// True when the record's value for this field equals `value` exactly.
    pub fn matches(&self, record: &Record, value: &str) -> bool {
        self.get(record) == value
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
