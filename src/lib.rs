//! # bsonsql - BSON to SQL conversion
//!
//! Turns a MongoDB BSON export into a SQL script (DDL + INSERTs) for
//! PostgreSQL, MySQL or SQLite, driven by a JSON schema mapping.
//!
//! ## Modules
//!
//! - **decode**: walk a buffer of length-prefixed BSON documents
//! - **resolve**: dotted field paths into decoded documents
//! - **dialect**: per-dialect column type vocabulary
//! - **format**: SQL literals for document values
//! - **schema**: the table/column mapping file
//! - **projection**: documents to rows (with one level of array expansion) and rows to SQL
//!
//! ## Quick Start
//!
//! ```rust
//! use bsonsql::{convert_bytes, ConvertConfig, Dialect, Schema};
//! use bson::doc;
//! use chrono::Utc;
//!
//! # fn main() -> anyhow::Result<()> {
//! let schema = Schema::from_json(r#"{
//!     "tables": {
//!         "users": {
//!             "primary_key": "id",
//!             "columns": {"id": "id", "username": "string"},
//!             "field_mapping": {"id": "_id", "username": "username"}
//!         }
//!     }
//! }"#)?;
//!
//! let mut bytes = Vec::new();
//! doc! {"_id": 7, "username": "ada"}.to_writer(&mut bytes)?;
//!
//! let output = convert_bytes(&bytes, schema, Dialect::Mysql, ConvertConfig::default(), Utc::now())?;
//! assert!(output.script.contains("INSERT INTO users (id, username) VALUES (7, 'ada');"));
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::Path;
use tracing::info;

pub mod decode;
pub mod dialect;
pub mod error;
pub mod format;
pub mod generator;
pub mod projection;
pub mod resolve;
pub mod schema;
pub mod types;

// Re-export commonly used types for convenience
pub use decode::{read_all, BsonDecoder, DocumentDecoder, DocumentStream};
pub use dialect::{map_type, Dialect};
pub use error::{DecodeError, DialectError, SchemaError};
pub use format::format_value;
pub use generator::{GenerationStats, SqlGenerator};
pub use resolve::resolve;
pub use schema::{ParentLink, Schema, TableConfig, EXAMPLE_SCHEMA};
pub use types::{ConvertConfig, Document, Value};

/// Result of converting one buffer
#[derive(Debug)]
pub struct Conversion {
    pub script: String,
    pub stats: GenerationStats,
    /// Set when decoding stopped before the end of the input
    pub truncated: Option<DecodeError>,
}

/// Convert an in-memory BSON export into a SQL script
pub fn convert_bytes(
    bytes: &[u8],
    schema: Schema,
    dialect: Dialect,
    config: ConvertConfig,
    generated_at: DateTime<Utc>,
) -> Result<Conversion> {
    let generator = SqlGenerator::with_config(schema, dialect, config)?;
    let stream = read_all(bytes, &BsonDecoder);

    let mut buffer = Vec::new();
    let mut stats = generator.write_script(&stream.documents, generated_at, &mut buffer)?;
    stats.truncated_at = stream.truncated.as_ref().map(|err| err.offset);
    let script = String::from_utf8(buffer).context("Generated script is not UTF-8")?;

    Ok(Conversion {
        script,
        stats,
        truncated: stream.truncated,
    })
}

/// Main entry point: read a BSON file and a schema file, write the script to `writer`
///
/// The schema is loaded before the BSON file is read, so a bad schema fails
/// without touching the data. A decode failure part-way through the data is
/// logged and the documents before it are still converted.
pub fn convert_files<P, Q, W>(
    bson_path: P,
    schema_path: Q,
    dialect: Dialect,
    config: ConvertConfig,
    writer: W,
) -> Result<GenerationStats>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    W: Write,
{
    let schema_path = schema_path.as_ref();
    let bson_path = bson_path.as_ref();

    let schema = Schema::load(schema_path)
        .with_context(|| format!("Failed to load schema {}", schema_path.display()))?;
    let generator = SqlGenerator::with_config(schema, dialect, config)?;

    let bytes = std::fs::read(bson_path)
        .with_context(|| format!("Failed to read BSON file {}", bson_path.display()))?;
    let stream = read_all(&bytes, &BsonDecoder);
    info!(
        documents = stream.documents.len(),
        bytes = bytes.len(),
        complete = stream.is_complete(),
        "read {}",
        bson_path.display()
    );

    let mut stats = generator.write_script(&stream.documents, Utc::now(), writer)?;
    stats.truncated_at = stream.truncated.map(|err| err.offset);
    Ok(stats)
}
