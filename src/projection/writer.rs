use crate::dialect::Dialect;
use crate::format::format_value;
use crate::projection::extractor::Row;
use crate::schema::{Schema, TableConfig};
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use std::io::Write;

/// `CREATE TABLE IF NOT EXISTS` for one table, columns in declaration order
///
/// `PRIMARY KEY` is appended to the primary key column unless its mapped type
/// already contains it, as sqlite's `id` type does.
pub fn create_table_statement(dialect: Dialect, table: &str, config: &TableConfig) -> String {
    let columns: Vec<String> = config
        .columns
        .iter()
        .map(|(column, abstract_type)| {
            let ddl_type = dialect.map_type(abstract_type);
            let mut definition = format!("  {} {}", column, ddl_type);
            if config.is_primary_key(column) && !ddl_type.contains("PRIMARY KEY") {
                definition.push_str(" PRIMARY KEY");
            }
            if config.is_not_null(column) {
                definition.push_str(" NOT NULL");
            }
            definition
        })
        .collect();

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n);",
        table,
        columns.join(",\n")
    )
}

/// `INSERT INTO` for one projected row
pub fn insert_statement(dialect: Dialect, row: &Row) -> String {
    let columns: Vec<&str> = row.columns().collect();
    let values: Vec<String> = row
        .values
        .iter()
        .map(|(column, value)| format_value(dialect, Some(value), column))
        .collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({});",
        row.table,
        columns.join(", "),
        values.join(", ")
    )
}

/// Streams a SQL script section by section
pub struct ScriptWriter<W: Write> {
    writer: W,
    dialect: Dialect,
    statements: usize,
}

impl<W: Write> ScriptWriter<W> {
    pub fn new(writer: W, dialect: Dialect) -> Self {
        ScriptWriter {
            writer,
            dialect,
            statements: 0,
        }
    }

    pub fn write_header(&mut self, generated_at: DateTime<Utc>, documents: usize) -> Result<()> {
        writeln!(self.writer, "-- Generated by bsonsql")?;
        writeln!(self.writer, "-- Dialect: {}", self.dialect)?;
        writeln!(
            self.writer,
            "-- Generated at: {}",
            generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        )?;
        writeln!(self.writer, "-- Documents: {}", documents)?;
        writeln!(self.writer).context("Failed to write script header")
    }

    /// One CREATE TABLE per table, each followed by a blank line
    pub fn write_ddl(&mut self, schema: &Schema) -> Result<()> {
        for (table, config) in &schema.tables {
            let statement = create_table_statement(self.dialect, table, config);
            writeln!(self.writer, "{}\n", statement)
                .with_context(|| format!("Failed to write DDL for {}", table))?;
            self.statements += 1;
        }
        Ok(())
    }

    pub fn begin(&mut self) -> Result<()> {
        writeln!(self.writer, "BEGIN;").context("Failed to write BEGIN")
    }

    pub fn write_row(&mut self, row: &Row) -> Result<()> {
        writeln!(self.writer, "{}", insert_statement(self.dialect, row))
            .context("Failed to write INSERT")?;
        self.statements += 1;
        Ok(())
    }

    pub fn commit(&mut self) -> Result<()> {
        writeln!(self.writer, "COMMIT;").context("Failed to write COMMIT")
    }

    /// DDL and INSERT statements written so far
    pub fn statements(&self) -> usize {
        self.statements
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush writer")
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;
    use chrono::TimeZone;
    use serde_json::json;

    fn squash(s: &str) -> String {
        s.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn users() -> TableConfig {
        serde_json::from_value(json!({
            "primary_key": "id",
            "columns": {"id": "id", "username": "string"},
            "not_null": ["username"],
            "field_mapping": {"id": "_id", "username": "username"}
        }))
        .unwrap()
    }

    #[test]
    fn test_create_table_mysql() {
        let ddl = create_table_statement(Dialect::Mysql, "users", &users());
        assert_eq!(
            squash(&ddl),
            "CREATE TABLE IF NOT EXISTS users ( id INT AUTO_INCREMENT PRIMARY KEY, username VARCHAR(255) NOT NULL );"
        );
    }

    #[test]
    fn test_create_table_postgresql() {
        let ddl = create_table_statement(Dialect::Postgresql, "users", &users());
        assert_eq!(
            ddl,
            "CREATE TABLE IF NOT EXISTS users (\n  id SERIAL PRIMARY KEY,\n  username TEXT NOT NULL\n);"
        );
    }

    #[test]
    fn test_sqlite_primary_key_not_repeated() {
        let ddl = create_table_statement(Dialect::Sqlite, "users", &users());
        assert!(ddl.contains("  id INTEGER PRIMARY KEY AUTOINCREMENT,\n"));
        assert_eq!(ddl.matches("PRIMARY KEY").count(), 1);
    }

    #[test]
    fn test_primary_key_on_plain_type() {
        let config: TableConfig = serde_json::from_value(json!({
            "primary_key": "code",
            "columns": {"code": "string", "n": "int"},
            "field_mapping": {"code": "code"}
        }))
        .unwrap();

        let ddl = create_table_statement(Dialect::Sqlite, "codes", &config);
        assert!(ddl.contains("  code TEXT PRIMARY KEY,\n"));
        assert!(ddl.contains("  n INTEGER\n"));
    }

    #[test]
    fn test_insert_statement() {
        let row = Row {
            table: "users".to_string(),
            values: vec![
                ("id".to_string(), Value::Int(7)),
                ("username".to_string(), Value::from("ada")),
            ],
        };

        assert_eq!(
            insert_statement(Dialect::Mysql, &row),
            "INSERT INTO users (id, username) VALUES (7, 'ada');"
        );
    }

    #[test]
    fn test_script_sections() {
        let schema = Schema::from_json(
            &json!({"tables": {"users": {
                "columns": {"id": "int"},
                "field_mapping": {"id": "_id"}
            }}})
            .to_string(),
        )
        .unwrap();
        let generated_at = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();

        let mut writer = ScriptWriter::new(Vec::new(), Dialect::Postgresql);
        writer.write_header(generated_at, 1).unwrap();
        writer.write_ddl(&schema).unwrap();
        writer.begin().unwrap();
        writer
            .write_row(&Row {
                table: "users".to_string(),
                values: vec![("id".to_string(), Value::Int(1))],
            })
            .unwrap();
        writer.commit().unwrap();
        assert_eq!(writer.statements(), 2);

        let script = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(
            script,
            "-- Generated by bsonsql\n\
             -- Dialect: postgresql\n\
             -- Generated at: 2024-05-06T07:08:09Z\n\
             -- Documents: 1\n\
             \n\
             CREATE TABLE IF NOT EXISTS users (\n  id INTEGER\n);\n\
             \n\
             BEGIN;\n\
             INSERT INTO users (id) VALUES (1);\n\
             COMMIT;\n"
        );
    }
}
