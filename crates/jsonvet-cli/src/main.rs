//! # jsonvet CLI Entry Point
//!
//! Connects to the audited database, loads the schema files and the
//! run configuration, drives the audit, and reports the totals.

mod config;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Local;
use clap::Parser;

use jsonvet_db::PgRowSource;
use jsonvet_engine::{run_audit, DiagnosticSink, RunContext, SchemaSource};
use jsonvet_schema::TypeRegistry;

use crate::config::Config;

/// Batch-validates JSON table columns against their JSON Schemas.
///
/// Every failing record is localized to its most specific sub-field and
/// appended to an append-only diagnostic log keyed by the run start
/// time; the run ends with total/valid/invalid counts.
#[derive(Parser, Debug)]
#[command(name = "jsonvet", version, about)]
struct Cli {
    /// Postgres connection string.
    #[arg(short = 'c', long)]
    connection_string: String,

    /// Path to the YAML run configuration.
    #[arg(long, default_value = "constants.yaml")]
    config: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    let schemas = load_schema_sources(&config.schemas_dir)?;

    let mut source = PgRowSource::connect(&cli.connection_string)?;
    tracing::info!("connected to the database");

    // The log lands next to the schemas directory, as its sibling.
    let log_dir = match config.schemas_dir.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let sink = DiagnosticSink::new(&log_dir, Local::now());
    let mut ctx = RunContext::new(sink);
    let registry = TypeRegistry::new();

    run_audit(
        &schemas,
        &config.table_columns,
        &registry,
        &mut source,
        &mut ctx,
    )?;

    let (summary, log_path) = ctx.finish()?;
    println!("Total checked: {}", summary.total);
    println!("Valid: {}", summary.valid);
    println!("Invalid: {}", summary.invalid);
    if let Some(path) = log_path {
        println!("Diagnostics written to {}", path.display());
    }
    Ok(())
}

/// List the regular files in the schemas directory, sorted by name for
/// a deterministic audit order, and read their contents.
fn load_schema_sources(schemas_dir: &Path) -> anyhow::Result<Vec<SchemaSource>> {
    let entries = fs::read_dir(schemas_dir)
        .with_context(|| format!("cannot read schemas directory {}", schemas_dir.display()))?;
    let mut sources = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("cannot read schema file {}", path.display()))?;
        sources.push(SchemaSource {
            file_name: file_name.to_owned(),
            text,
        });
    }
    sources.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(sources)
}
