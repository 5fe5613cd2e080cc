//! Error types for decoding, schema loading and dialect selection.
//!
//! Unresolvable field paths are not errors: the resolver reports them as
//! absent and the projector drops the column.

use std::path::PathBuf;
use thiserror::Error;

/// The document stream could not be decoded past `offset`
#[derive(Debug, Error)]
#[error("failed to decode document at byte offset {offset}: {reason}")]
pub struct DecodeError {
    pub offset: usize,
    pub reason: String,
}

impl DecodeError {
    pub fn new(offset: usize, reason: impl Into<String>) -> Self {
        DecodeError {
            offset,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read schema file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed schema JSON")]
    Parse(#[from] serde_json::Error),

    #[error("schema has no tables")]
    NoTables,

    #[error("table `{table}`: {reason}")]
    InvalidTable { table: String, reason: String },
}

impl SchemaError {
    pub(crate) fn table(table: &str, reason: impl Into<String>) -> Self {
        SchemaError::InvalidTable {
            table: table.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DialectError {
    #[error("unknown dialect `{0}` (expected one of: postgresql, mysql, sqlite)")]
    Unknown(String),
}
