// Linked for its dialect module registration
extern crate point_ext;

use std::fs;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;
use vchord_dialect::compiler::{CompiledUnit, Compiler};
use vchord_dialect::config::Config;

fn print_report(unit: &CompiledUnit) {
    for table in &unit.tables {
        println!("table {}", table.name);
        for column in &table.columns {
            println!("  {} {}", column.name, column.ty);
        }
    }
    for index in &unit.indexes {
        let method = index.method.as_deref().unwrap_or("btree");
        println!(
            "index {} on {} using {} ({})",
            index.name.as_deref().unwrap_or("<unnamed>"),
            index.table,
            method,
            index.columns.join(", ")
        );
    }
    for query in &unit.queries {
        println!("query {}", query.label.as_deref().unwrap_or("<unnamed>"));
        for column in &query.columns {
            println!("  column {} {} = {}", column.name, column.ty, column.reader);
        }
        for argument in &query.arguments {
            println!("  argument {} {} -> {}", argument.label, argument.ty, argument.binder);
        }
    }
}

fn check(compiler: &Compiler, config: &Config) -> Result<bool> {
    let mut ok = true;
    let mut reports = serde_json::Map::new();

    for path in &config.files {
        let sql = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        match compiler.compile(&sql) {
            Ok(unit) if config.json => {
                reports.insert(path.display().to_string(), serde_json::to_value(&unit)?);
            }
            Ok(unit) => {
                println!("-- {}", path.display());
                print_report(&unit);
            }
            Err(e) => {
                eprintln!("{}: {}", path.display(), e);
                ok = false;
            }
        }
    }

    if config.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    Ok(ok)
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_args();
    let compiler = Compiler::from_config(&config).context("loading dialect modules")?;
    info!(modules = ?compiler.modules(), files = config.files.len(), "checking");

    if check(&compiler, &config)? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
