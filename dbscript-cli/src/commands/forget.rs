//! Forget command - drop a script from the execution log so it runs again

use anyhow::Result;
use colored::Colorize;
use dbscript_core::ports::ExecutionLog;
use dbscript_core::LogEvent;
use dialoguer::Confirm;

use super::{get_context, get_logger, log_event, ConfigSource};
use crate::output;

pub fn run(source: &ConfigSource, database: &str, script: &str, force: bool) -> Result<()> {
    let ctx = get_context(source)?;
    let db = ctx.config.database(database)?;

    // Confirm removal unless --force
    if !force {
        println!(
            "\n{}",
            format!(
                "This will remove '{}' from the execution log of '{}'.",
                script, db.name
            )
            .yellow()
        );
        println!("{}\n", "The script will run again on the next run.".dimmed());

        if !Confirm::new()
            .with_prompt("Are you sure?")
            .default(false)
            .interact()?
        {
            println!("{}\n", "Cancelled".dimmed());
            return Ok(());
        }
    }

    if ctx.engine.forget(script, db)? {
        log_event(
            &get_logger(),
            LogEvent::new("script_forgotten")
                .with_database(&db.name)
                .with_script(script),
        );
        output::success(&format!("Removed '{}' from '{}'", script, db.name));
    } else {
        output::warning(&format!("'{}' is not recorded for '{}'", script, db.name));
    }

    Ok(())
}
