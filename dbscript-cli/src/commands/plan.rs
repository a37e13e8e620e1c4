//! Plan command - preview a run without executing anything

use anyhow::Result;
use colored::Colorize;
use dbscript_core::services::PlanStatus;

use super::{get_context, ConfigSource};
use crate::output;

pub fn run(source: &ConfigSource, databases: &[String], validate: bool, json: bool) -> Result<()> {
    let ctx = get_context(source)?;
    let plans = ctx.plan(databases, validate)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plans)?);
        return Ok(());
    }

    for plan in &plans {
        println!();
        println!("{}", format!("Database: {}", plan.database_name).bold());

        if plan.scripts.is_empty() {
            println!("{}", "  No scripts found".dimmed());
        } else {
            let mut table = output::create_table();
            let mut header = vec!["Category", "Script", "Status"];
            if validate {
                header.push("Syntax");
            }
            table.set_header(header);

            for script in &plan.scripts {
                let status = match &script.status {
                    PlanStatus::Applied => "applied".dimmed().to_string(),
                    PlanStatus::Pending => "pending".green().to_string(),
                    PlanStatus::Unknown { message } => {
                        format!("unknown: {}", message).yellow().to_string()
                    }
                };
                let mut row = vec![
                    script.category.to_string(),
                    script.script_name.clone(),
                    status,
                ];
                if validate {
                    row.push(match &script.syntax_error {
                        Some(e) => e.red().to_string(),
                        None => String::new(),
                    });
                }
                table.add_row(row);
            }

            println!("{}", table);
        }

        if !plan.missing_categories.is_empty() {
            let names: Vec<_> = plan
                .missing_categories
                .iter()
                .map(|c| c.folder_name())
                .collect();
            println!("{}", format!("  Missing folders: {}", names.join(", ")).dimmed());
        }
        for unreadable in &plan.unreadable_categories {
            output::warning(&format!(
                "  {} skipped: {}",
                unreadable.category, unreadable.message
            ));
        }

        let summary = format!("  {} pending, {} applied", plan.pending(), plan.applied());
        if validate && plan.syntax_errors() > 0 {
            output::warning(&format!("{}, {} with syntax errors", summary, plan.syntax_errors()));
        } else {
            output::info(&summary);
        }
    }

    Ok(())
}
