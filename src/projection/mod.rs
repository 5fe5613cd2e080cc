//! Document-to-relational projection
//!
//! This module turns decoded documents into table rows and rows into SQL.
//!
//! ## Array expansion
//!
//! A table whose `field_mapping` holds a `[]` path (for example
//! `pages[].text`) emits one row per element of that array instead of one
//! row per document. Other mapped columns still resolve against the
//! top-level document, and an optional `parent_link` copies a parent field
//! into every expanded row.

pub mod extractor;
pub mod plan;
pub mod writer;

pub use extractor::{Row, RowProjector};
pub use plan::{ArrayExpansion, ColumnSource, PlannedColumn, TablePlan};
pub use writer::{create_table_statement, insert_statement, ScriptWriter};
