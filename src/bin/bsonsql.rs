//! bsonsql: Convert a MongoDB BSON export into a SQL script
//!
//! Usage:
//!   # MySQL (default dialect), script on stdout
//!   bsonsql users.bson schema.json
//!
//!   # PostgreSQL, written to a file
//!   bsonsql users.bson schema.json postgresql -o users.sql
//!
//!   # Data only, no transaction envelope
//!   bsonsql users.bson schema.json sqlite --no-ddl --no-transaction
//!
//!   # Print a starter schema
//!   bsonsql --example-schema

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use bsonsql::{convert_files, ConvertConfig, Dialect, EXAMPLE_SCHEMA};
use clap::{CommandFactory, Parser};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::process;
use std::str::FromStr;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = "Example schema (print it with --example-schema):";

#[derive(Parser, Debug)]
#[command(name = "bsonsql")]
#[command(about = "Convert a MongoDB BSON export into SQL statements", long_about = None)]
#[command(arg_required_else_help = true)]
#[command(after_help = format!("{}\n{}", AFTER_HELP, EXAMPLE_SCHEMA))]
struct Args {
    /// BSON export file (concatenated documents, as written by mongodump)
    #[arg(value_name = "BSON_FILE", required_unless_present = "example_schema")]
    bson_file: Option<String>,

    /// JSON schema mapping tables and columns to document fields
    #[arg(value_name = "SCHEMA_FILE", required_unless_present = "example_schema")]
    schema_file: Option<String>,

    /// Target dialect: postgresql, mysql or sqlite
    #[arg(value_name = "DIALECT", default_value = "mysql")]
    dialect: String,

    /// Write the script to this file instead of stdout
    #[arg(long, short = 'o')]
    output: Option<String>,

    /// Skip CREATE TABLE statements
    #[arg(long)]
    no_ddl: bool,

    /// Skip the BEGIN/COMMIT envelope
    #[arg(long)]
    no_transaction: bool,

    /// Print an example schema and exit
    #[arg(long)]
    example_schema: bool,

    /// Log debug details to stderr
    #[arg(long, short = 'v', conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(long, short = 'q')]
    quiet: bool,
}

fn main() {
    let args = Args::parse();
    init_logging(&args);

    if args.example_schema {
        println!("{}", EXAMPLE_SCHEMA);
        return;
    }

    // Checked before any file is opened
    let dialect = match Dialect::from_str(&args.dialect) {
        Ok(dialect) => dialect,
        Err(err) => {
            error!("{}", err);
            eprintln!("{}", Args::command().render_help());
            process::exit(1);
        }
    };

    if let Err(err) = run(&args, dialect) {
        error!("{:#}", err);
        process::exit(1);
    }
}

fn init_logging(args: &Args) {
    let default_level = if args.verbose {
        "debug"
    } else if args.quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .init();
}

fn run(args: &Args, dialect: Dialect) -> Result<()> {
    // clap guarantees both are present unless --example-schema was given
    let (Some(bson_file), Some(schema_file)) = (&args.bson_file, &args.schema_file) else {
        anyhow::bail!("BSON_FILE and SCHEMA_FILE are required");
    };

    let config = ConvertConfig {
        include_ddl: !args.no_ddl,
        use_transaction: !args.no_transaction,
    };

    let stats = match &args.output {
        Some(path) => {
            // Write to a sibling first so a failed run leaves no partial script behind
            let tmp_path = format!("{}.partial", path);
            let file = File::create(&tmp_path)
                .with_context(|| format!("Failed to create output file {}", tmp_path))?;
            let stats = convert_files(bson_file, schema_file, dialect, config, BufWriter::new(file));
            match stats {
                Ok(stats) => {
                    std::fs::rename(&tmp_path, path)
                        .with_context(|| format!("Failed to move output into place at {}", path))?;
                    info!(path = %path, "script written");
                    stats
                }
                Err(err) => {
                    let _ = std::fs::remove_file(&tmp_path);
                    return Err(err);
                }
            }
        }
        None => {
            // Buffer so that a fatal error never leaves a partial script on stdout
            let mut buffer = Vec::new();
            let stats = convert_files(bson_file, schema_file, dialect, config, &mut buffer)?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&buffer).context("Failed to write script to stdout")?;
            stdout.flush().context("Failed to flush stdout")?;
            stats
        }
    };

    if let Some(offset) = stats.truncated_at {
        warn!(
            offset,
            documents = stats.documents,
            "input was truncated by a decode failure; script covers documents before it"
        );
    }
    info!(
        documents = stats.documents,
        inserts = stats.total_rows(),
        dialect = %dialect,
        "done"
    );

    Ok(())
}
