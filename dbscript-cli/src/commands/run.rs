//! Run command - execute pending scripts against the configured databases

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use colored::Colorize;
use dbscript_core::adapters::recording::RecordingReporter;
use dbscript_core::services::BatchReport;
use dbscript_core::{
    Category, DatabaseConfig, DatabaseSummary, FailureStage, LogEvent, LoggingService, Reporter,
    ScriptFile, ScriptOutcome,
};

use super::{get_context, get_logger, log_event, ConfigSource};
use crate::output;

/// Prints progress lines as scripts finish
struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn database_started(&mut self, database: &DatabaseConfig) {
        println!();
        println!("{}", format!("Database: {}", database.name).bold());
    }

    fn category_started(
        &mut self,
        _database: &DatabaseConfig,
        category: Category,
        file_count: usize,
    ) {
        output::info(&format!("  {} ({} scripts)", category, file_count));
    }

    fn category_missing(&mut self, _database: &DatabaseConfig, category: Category, path: &Path) {
        println!(
            "{}",
            format!("  {} skipped: {} does not exist", category, path.display()).dimmed()
        );
    }

    fn category_unreadable(
        &mut self,
        _database: &DatabaseConfig,
        category: Category,
        message: &str,
    ) {
        output::warning(&format!("  {} skipped: {}", category, message));
    }

    fn script_finished(
        &mut self,
        _database: &DatabaseConfig,
        script: &ScriptFile,
        outcome: &ScriptOutcome,
    ) {
        match outcome {
            ScriptOutcome::Executed => {
                println!("    {} {}", "✓".green(), script.name);
            }
            ScriptOutcome::Skipped => {
                println!("    {} {} {}", "-".cyan(), script.name, "(already executed)".dimmed());
            }
            ScriptOutcome::Failed { stage, message } => {
                let line = format!("    ✗ {}: {}", script.name, message);
                match stage {
                    // The script was never attempted; a later run will retry it
                    FailureStage::LogCheck => output::warning(&line),
                    FailureStage::Read | FailureStage::Execute => println!("{}", line.red()),
                }
            }
            ScriptOutcome::Unrecorded { message } => {
                output::warning(&format!(
                    "    ! {} executed but not recorded: {}",
                    script.name, message
                ));
            }
        }
    }
}

/// Forwards events to another reporter and records problems in the event log
struct EventLogReporter<'a> {
    inner: &'a mut dyn Reporter,
    logger: &'a Option<LoggingService>,
}

impl Reporter for EventLogReporter<'_> {
    fn database_started(&mut self, database: &DatabaseConfig) {
        self.inner.database_started(database);
    }

    fn category_started(
        &mut self,
        database: &DatabaseConfig,
        category: Category,
        file_count: usize,
    ) {
        self.inner.category_started(database, category, file_count);
    }

    fn category_missing(&mut self, database: &DatabaseConfig, category: Category, path: &Path) {
        self.inner.category_missing(database, category, path);
    }

    fn category_unreadable(
        &mut self,
        database: &DatabaseConfig,
        category: Category,
        message: &str,
    ) {
        log_event(
            self.logger,
            LogEvent::new("category_unreadable")
                .with_database(&database.name)
                .with_details(category.folder_name())
                .with_error(message),
        );
        self.inner.category_unreadable(database, category, message);
    }

    fn script_finished(
        &mut self,
        database: &DatabaseConfig,
        script: &ScriptFile,
        outcome: &ScriptOutcome,
    ) {
        let event = match outcome {
            ScriptOutcome::Failed { stage, message } => Some(
                LogEvent::new("script_failed")
                    .with_details(format!("{:?}", stage))
                    .with_error(message),
            ),
            ScriptOutcome::Unrecorded { message } => {
                Some(LogEvent::new("script_unrecorded").with_error(message))
            }
            ScriptOutcome::Executed | ScriptOutcome::Skipped => None,
        };
        if let Some(event) = event {
            log_event(
                self.logger,
                event.with_database(&database.name).with_script(&script.name),
            );
        }
        self.inner.script_finished(database, script, outcome);
    }

    fn database_finished(&mut self, summary: &DatabaseSummary) {
        log_event(
            self.logger,
            LogEvent::new("database_processed")
                .with_database(&summary.database_name)
                .with_details(format!(
                    "total={} executed={} skipped={} failed={} unrecorded={}",
                    summary.total_files,
                    summary.executed_files,
                    summary.skipped_files,
                    summary.failed_files,
                    summary.unrecorded_files
                )),
        );
        self.inner.database_finished(summary);
    }
}

pub fn run(
    source: &ConfigSource,
    databases: &[String],
    json: bool,
    strict: bool,
) -> Result<ExitCode> {
    let logger = get_logger();

    let ctx = match get_context(source) {
        Ok(ctx) => ctx,
        Err(e) => {
            log_event(&logger, LogEvent::new("config_error").with_error(format!("{:#}", e)));
            return Err(e);
        }
    };

    log_event(
        &logger,
        LogEvent::new("run_started").with_details(format!(
            "scripts_folder={} databases={}",
            ctx.config.scripts_folder.display(),
            if databases.is_empty() {
                "all".to_string()
            } else {
                databases.join(",")
            }
        )),
    );

    let report = if json {
        let mut recorder = RecordingReporter::new();
        let report = ctx.run(
            databases,
            &mut EventLogReporter {
                inner: &mut recorder,
                logger: &logger,
            },
        )?;
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "events": recorder.events,
                "databases": report.databases,
            }))?
        );
        report
    } else {
        let report = ctx.run(
            databases,
            &mut EventLogReporter {
                inner: &mut ConsoleReporter,
                logger: &logger,
            },
        )?;
        print_summary(&report);
        report
    };

    if strict && report.has_failures() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_summary(report: &BatchReport) {
    println!();

    let mut table = output::create_table();
    table.set_header(vec!["Database", "Total", "Executed", "Skipped", "Failed", "Unrecorded"]);

    for summary in &report.databases {
        table.add_row(vec![
            summary.database_name.clone(),
            summary.total_files.to_string(),
            summary.executed_files.to_string(),
            summary.skipped_files.to_string(),
            summary.failed_files.to_string(),
            summary.unrecorded_files.to_string(),
        ]);
    }

    println!("{}", table);

    let totals = report.totals();
    if totals.failed_files > 0 {
        output::error(&format!("{} script(s) failed", totals.failed_files));
    }
    if totals.unrecorded_files > 0 {
        output::warning(&format!(
            "{} script(s) ran but are not in the execution log and will run again",
            totals.unrecorded_files
        ));
    }
    if !report.has_failures() {
        output::success(&format!(
            "No failures: {} executed, {} skipped",
            totals.executed_files, totals.skipped_files
        ));
    }
}
