use crate::dialect::Dialect;
use crate::error::SchemaError;
use crate::projection::{
    create_table_statement, insert_statement, Row, RowProjector, ScriptWriter, TablePlan,
};
use crate::schema::Schema;
use crate::types::{ConvertConfig, Document};
use anyhow::Result;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::io::Write;
use tracing::info;

/// Counts gathered while writing a script
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationStats {
    pub documents: usize,
    /// INSERTs per table, in schema order
    pub rows: IndexMap<String, usize>,
    /// Byte offset where decoding stopped early
    pub truncated_at: Option<usize>,
}

impl GenerationStats {
    pub fn total_rows(&self) -> usize {
        self.rows.values().sum()
    }
}

/// Schema-driven SQL generation for one dialect
pub struct SqlGenerator {
    schema: Schema,
    dialect: Dialect,
    config: ConvertConfig,
    projectors: Vec<RowProjector>,
}

impl SqlGenerator {
    pub fn new(schema: Schema, dialect: Dialect) -> Result<Self, SchemaError> {
        Self::with_config(schema, dialect, ConvertConfig::default())
    }

    pub fn with_config(
        schema: Schema,
        dialect: Dialect,
        config: ConvertConfig,
    ) -> Result<Self, SchemaError> {
        let projectors = schema
            .tables
            .iter()
            .map(|(name, table)| TablePlan::new(name, table).map(RowProjector::new))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SqlGenerator {
            schema,
            dialect,
            config,
            projectors,
        })
    }

    pub fn create_table_statements(&self) -> Vec<String> {
        self.schema
            .tables
            .iter()
            .map(|(name, table)| create_table_statement(self.dialect, name, table))
            .collect()
    }

    /// Rows for one document, table by table in schema order
    pub fn rows(&self, doc: &Document) -> Vec<Row> {
        self.projectors
            .iter()
            .flat_map(|projector| projector.project(doc))
            .collect()
    }

    pub fn insert_statements(&self, doc: &Document) -> Vec<String> {
        self.rows(doc)
            .iter()
            .map(|row| insert_statement(self.dialect, row))
            .collect()
    }

    /// Write the full script: header, DDL, then INSERTs in document order
    pub fn write_script<W: Write>(
        &self,
        documents: &[Document],
        generated_at: DateTime<Utc>,
        writer: W,
    ) -> Result<GenerationStats> {
        let mut script = ScriptWriter::new(writer, self.dialect);
        let mut stats = GenerationStats {
            documents: documents.len(),
            rows: self.schema.tables.keys().map(|t| (t.clone(), 0)).collect(),
            ..Default::default()
        };

        script.write_header(generated_at, documents.len())?;
        if self.config.include_ddl {
            script.write_ddl(&self.schema)?;
        }
        if self.config.use_transaction {
            script.begin()?;
        }

        for doc in documents {
            for row in self.rows(doc) {
                script.write_row(&row)?;
                *stats.rows.entry(row.table).or_default() += 1;
            }
        }

        if self.config.use_transaction {
            script.commit()?;
        }
        script.flush()?;

        info!(
            documents = stats.documents,
            inserts = stats.total_rows(),
            dialect = %self.dialect,
            "script generated"
        );
        for (table, count) in &stats.rows {
            info!(table = %table, rows = count, "table rows");
        }

        Ok(stats)
    }

    /// Generate the script as a string
    pub fn generate_script(&self, documents: &[Document], generated_at: DateTime<Utc>) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_script(documents, generated_at, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
