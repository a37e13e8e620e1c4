//! History command - list a database's execution log

use anyhow::{Context, Result};
use colored::Colorize;
use dbscript_core::ports::ExecutionLog;

use super::{get_context, ConfigSource};
use crate::output;

pub fn run(source: &ConfigSource, database: &str, json: bool) -> Result<()> {
    let ctx = get_context(source)?;
    let db = ctx.config.database(database)?;
    let entries = ctx
        .engine
        .entries(db)
        .with_context(|| format!("Failed to read execution log of '{}'", db.name))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("{}", format!("No scripts recorded for '{}'", db.name).dimmed());
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Executed At (UTC)", "Script"]);
    for entry in &entries {
        table.add_row(vec![
            entry.executed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            entry.script_name.clone(),
        ]);
    }

    println!("{}", table);
    output::info(&format!(
        "{} script(s) recorded in {}",
        entries.len(),
        ctx.engine.log_table()
    ));

    Ok(())
}
