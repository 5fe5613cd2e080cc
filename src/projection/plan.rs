//! Per-table projection plans
//!
//! A plan is computed once per table when the generator is built, so that
//! projecting each document is a straight walk over the planned columns.

use crate::error::SchemaError;
use crate::resolve::EXPANSION_MARKER;
use crate::schema::TableConfig;

/// Where a column's value comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSource {
    /// Dotted path into the top-level document
    Field(String),
    /// Dotted path into each element of the expanded array; empty means the element itself
    Element(String),
    /// Dotted path into the parent document, copied into every row
    Parent(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedColumn {
    pub column: String,
    pub source: ColumnSource,
}

/// The one array a table expands into rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayExpansion {
    /// Path to the array in the top-level document
    pub array_path: String,
    /// Path inside each element
    pub element_path: String,
}

impl ArrayExpansion {
    /// Split `pages[].text` into `pages` and `text`
    pub fn parse(path: &str) -> Result<Self, String> {
        let Some((array_path, rest)) = path.split_once(EXPANSION_MARKER) else {
            return Err(format!("`{}` has no `[]` marker", path));
        };

        if rest.contains(EXPANSION_MARKER) {
            return Err(format!("`{}` expands more than one array level", path));
        }
        if array_path.is_empty() || array_path.ends_with('.') {
            return Err(format!("`{}` has no array field before `[]`", path));
        }
        if array_path.contains(['[', ']']) || rest.contains(['[', ']']) {
            return Err(format!("`{}` has a stray bracket", path));
        }

        let element_path = match rest {
            "" => "",
            _ => match rest.strip_prefix('.') {
                Some(p) if !p.is_empty() => p,
                _ => return Err(format!("`{}` must continue with `.field` after `[]`", path)),
            },
        };

        Ok(ArrayExpansion {
            array_path: array_path.to_string(),
            element_path: element_path.to_string(),
        })
    }
}

/// Pre-computed projection for one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePlan {
    pub table: String,
    /// Columns in `field_mapping` order, parent link last when not mapped
    pub columns: Vec<PlannedColumn>,
    pub expansion: Option<ArrayExpansion>,
    /// Mapped columns declared `not_null`
    pub not_null: Vec<String>,
}

impl TablePlan {
    pub fn new(table: &str, config: &TableConfig) -> Result<Self, SchemaError> {
        let mut columns = Vec::with_capacity(config.field_mapping.len() + 1);
        let mut expansion: Option<ArrayExpansion> = None;

        if let Some(link) = &config.parent_link {
            if link.column.is_empty() {
                return Err(SchemaError::table(table, "parent_link.column is empty"));
            }
            if link.parent_field.contains(EXPANSION_MARKER) {
                return Err(SchemaError::table(
                    table,
                    format!("parent_link.parent_field `{}` cannot expand an array", link.parent_field),
                ));
            }
        }

        for (column, path) in &config.field_mapping {
            let source = match &config.parent_link {
                Some(link) if &link.column == column => {
                    if path.contains(EXPANSION_MARKER) {
                        return Err(SchemaError::table(
                            table,
                            format!(
                                "parent_link.column `{}` is also mapped to the `[]` path `{}`",
                                column, path
                            ),
                        ));
                    }
                    ColumnSource::Parent(link.parent_field.clone())
                }
                _ if path.contains(EXPANSION_MARKER) => {
                    if expansion.is_some() {
                        return Err(SchemaError::table(
                            table,
                            format!("more than one `[]` path (second is `{}` for `{}`)", path, column),
                        ));
                    }
                    let parsed = ArrayExpansion::parse(path).map_err(|e| SchemaError::table(table, e))?;
                    let element_path = parsed.element_path.clone();
                    expansion = Some(parsed);
                    ColumnSource::Element(element_path)
                }
                _ => ColumnSource::Field(path.clone()),
            };
            columns.push(PlannedColumn {
                column: column.clone(),
                source,
            });
        }

        if let Some(link) = &config.parent_link {
            if !columns.iter().any(|c| c.column == link.column) {
                columns.push(PlannedColumn {
                    column: link.column.clone(),
                    source: ColumnSource::Parent(link.parent_field.clone()),
                });
            }
        }

        let not_null = columns
            .iter()
            .filter(|c| config.is_not_null(&c.column))
            .map(|c| c.column.clone())
            .collect();

        Ok(TablePlan {
            table: table.to_string(),
            columns,
            expansion,
            not_null,
        })
    }

    /// True when each document yields one row per array element
    pub fn is_array_mode(&self) -> bool {
        self.expansion.is_some()
    }
}
