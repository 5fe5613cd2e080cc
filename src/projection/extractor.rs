use crate::projection::plan::{ColumnSource, TablePlan};
use crate::resolve::{resolve, resolve_in};
use crate::types::{Document, Value};
use tracing::debug;

/// One INSERT's worth of data: present columns only, in plan order
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub table: String,
    pub values: Vec<(String, Value)>,
}

impl Row {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(c, _)| c.as_str())
    }
}

/// Projects documents into rows for one table
pub struct RowProjector {
    plan: TablePlan,
}

impl RowProjector {
    pub fn new(plan: TablePlan) -> Self {
        RowProjector { plan }
    }

    /// Rows this document contributes to the table
    pub fn project(&self, doc: &Document) -> Vec<Row> {
        let Some(expansion) = &self.plan.expansion else {
            return self.build_row(doc, None).into_iter().collect();
        };

        let elements = match resolve(doc, &expansion.array_path).and_then(Value::as_array) {
            Some(items) if !items.is_empty() => items,
            _ => {
                debug!(
                    table = %self.plan.table,
                    path = %expansion.array_path,
                    "no array elements to expand"
                );
                return Vec::new();
            }
        };

        elements
            .iter()
            .filter_map(|element| self.build_row(doc, Some(element)))
            .collect()
    }

    /// Build a row, or `None` when no column resolved
    fn build_row(&self, doc: &Document, element: Option<&Value>) -> Option<Row> {
        let values: Vec<(String, Value)> = self
            .plan
            .columns
            .iter()
            .filter_map(|planned| {
                let value = match &planned.source {
                    ColumnSource::Field(path) | ColumnSource::Parent(path) => resolve(doc, path),
                    ColumnSource::Element(path) => element.and_then(|e| resolve_in(e, path)),
                }?;
                Some((planned.column.clone(), value.clone()))
            })
            .collect();

        if values.is_empty() {
            return None;
        }

        // not_null columns can still be dropped when their source is absent
        for column in &self.plan.not_null {
            if !values.iter().any(|(c, _)| c == column) {
                debug!(table = %self.plan.table, column = %column, "not_null column omitted: source absent");
            }
        }

        Some(Row {
            table: self.plan.table.clone(),
            values,
        })
    }
}
