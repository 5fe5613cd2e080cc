//! Schema mapping: which tables to create and where their columns come from
//!
//! A schema file is JSON. Tables are emitted in the order they are declared,
//! and columns in the order of each table's `columns` object.

pub mod example;
pub mod table;

pub use example::EXAMPLE_SCHEMA;
pub use table::{ParentLink, Schema, TableConfig};
