use crate::error::SchemaError;
use crate::projection::plan::TablePlan;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Table definitions keyed by table name, in declaration order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub tables: IndexMap<String, TableConfig>,
}

/// One target table: its columns and where each column's data comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,

    /// Column name to abstract type name, in DDL order
    pub columns: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_null: Vec<String>,

    /// SQL column to source field path; one path may carry a `[]` marker
    pub field_mapping: IndexMap<String, String>,

    /// Copies a field of the parent document into every expanded row
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_link: Option<ParentLink>,
}

/// Explicit parent-to-child link for array-expanded tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentLink {
    /// Column written in each child row
    pub column: String,

    /// Path resolved against the parent document
    pub parent_field: String,
}

impl TableConfig {
    pub fn is_not_null(&self, column: &str) -> bool {
        self.not_null.iter().any(|c| c == column)
    }

    pub fn is_primary_key(&self, column: &str) -> bool {
        self.primary_key.as_deref() == Some(column)
    }
}

impl Schema {
    /// Read and validate a schema file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parse and validate a schema from JSON text
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let schema: Schema = serde_json::from_str(json)?;
        schema.validate()?;
        debug!(tables = schema.tables.len(), "schema loaded");
        Ok(schema)
    }

    /// Presence checks plus the one-expansion-per-table rule
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.tables.is_empty() {
            return Err(SchemaError::NoTables);
        }

        for (name, table) in &self.tables {
            if table.columns.is_empty() {
                return Err(SchemaError::table(name, "no columns declared"));
            }

            if let Some(pk) = &table.primary_key {
                if !table.columns.contains_key(pk) {
                    return Err(SchemaError::table(
                        name,
                        format!("primary key `{}` is not a declared column", pk),
                    ));
                }
            }

            if let Some(column) = table.not_null.iter().find(|c| !table.columns.contains_key(*c)) {
                return Err(SchemaError::table(
                    name,
                    format!("not_null column `{}` is not a declared column", column),
                ));
            }

            if let Some(link) = &table.parent_link {
                if !table.columns.contains_key(&link.column) {
                    return Err(SchemaError::table(
                        name,
                        format!("parent_link column `{}` is not a declared column", link.column),
                    ));
                }
            }

            // Expansion and parent link rules live with the plan
            TablePlan::new(name, table)?;
        }

        Ok(())
    }
}
