//! Target SQL dialects and their column type vocabularies

use crate::error::DialectError;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// SQL dialect the script is generated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    Postgresql,
    #[default]
    Mysql,
    Sqlite,
}

impl Dialect {
    pub const ALL: [Dialect; 3] = [Dialect::Postgresql, Dialect::Mysql, Dialect::Sqlite];

    pub fn name(self) -> &'static str {
        match self {
            Dialect::Postgresql => "postgresql",
            Dialect::Mysql => "mysql",
            Dialect::Sqlite => "sqlite",
        }
    }

    /// Type used for unrecognized abstract types
    pub fn fallback_type(self) -> &'static str {
        match self {
            Dialect::Postgresql | Dialect::Mysql | Dialect::Sqlite => "TEXT",
        }
    }

    /// Map an abstract schema type (`string`, `int`, `json`, ...) to DDL keywords
    pub fn map_type(self, abstract_type: &str) -> &'static str {
        DIALECT_TYPES
            .get(&self)
            .and_then(|types| types.get(abstract_type))
            .copied()
            .unwrap_or_else(|| self.fallback_type())
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = DialectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgresql" | "postgres" | "pg" => Ok(Dialect::Postgresql),
            "mysql" => Ok(Dialect::Mysql),
            "sqlite" => Ok(Dialect::Sqlite),
            _ => Err(DialectError::Unknown(s.to_string())),
        }
    }
}

/// Map an abstract type for a dialect
pub fn map_type(dialect: Dialect, abstract_type: &str) -> &'static str {
    dialect.map_type(abstract_type)
}

// abstract type, postgresql, mysql, sqlite
const TYPE_TABLE: &[(&str, &str, &str, &str)] = &[
    ("id", "SERIAL", "INT AUTO_INCREMENT", "INTEGER PRIMARY KEY AUTOINCREMENT"),
    ("string", "TEXT", "VARCHAR(255)", "TEXT"),
    ("int", "INTEGER", "INT", "INTEGER"),
    ("bigint", "BIGINT", "BIGINT", "INTEGER"),
    ("float", "DOUBLE PRECISION", "DOUBLE", "REAL"),
    ("decimal", "DECIMAL", "DECIMAL", "REAL"),
    ("boolean", "BOOLEAN", "BOOLEAN", "INTEGER"),
    ("date", "DATE", "DATE", "TEXT"),
    ("datetime", "TIMESTAMP", "DATETIME", "TEXT"),
    ("timestamp", "TIMESTAMP", "TIMESTAMP", "TEXT"),
    ("json", "JSONB", "JSON", "TEXT"),
    ("text", "TEXT", "TEXT", "TEXT"),
];

/// Per-dialect abstract type lookup, built once
pub static DIALECT_TYPES: Lazy<HashMap<Dialect, HashMap<&'static str, &'static str>>> =
    Lazy::new(|| {
        Dialect::ALL
            .iter()
            .map(|&dialect| {
                let types: HashMap<_, _> = TYPE_TABLE
                    .iter()
                    .map(|&(name, pg, my, lite)| {
                        let ddl = match dialect {
                            Dialect::Postgresql => pg,
                            Dialect::Mysql => my,
                            Dialect::Sqlite => lite,
                        };
                        (name, ddl)
                    })
                    .collect();
                (dialect, types)
            })
            .collect()
    });
