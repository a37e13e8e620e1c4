//! Reporter that keeps every event in memory
//!
//! Used by tests to assert on processing order and by the CLI's `--json`
//! output.

use std::path::Path;

use crate::domain::{Category, DatabaseConfig, DatabaseSummary, ScriptFile, ScriptOutcome};
use crate::ports::{ReportEvent, Reporter};

#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub events: Vec<ReportEvent>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(script name, outcome)` pairs in the order scripts finished
    pub fn script_outcomes(&self) -> Vec<(String, ScriptOutcome)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                ReportEvent::ScriptFinished {
                    script, outcome, ..
                } => Some((script.clone(), outcome.clone())),
                _ => None,
            })
            .collect()
    }

    /// Names of scripts that actually reached the database, in order
    pub fn ran_scripts(&self) -> Vec<String> {
        self.script_outcomes()
            .into_iter()
            .filter(|(_, outcome)| outcome.ran())
            .map(|(name, _)| name)
            .collect()
    }

    pub fn missing_categories(&self) -> Vec<Category> {
        self.events
            .iter()
            .filter_map(|event| match event {
                ReportEvent::CategoryMissing { category, .. } => Some(*category),
                _ => None,
            })
            .collect()
    }
}

impl Reporter for RecordingReporter {
    fn database_started(&mut self, database: &DatabaseConfig) {
        self.events.push(ReportEvent::DatabaseStarted {
            database: database.name.clone(),
        });
    }

    fn category_started(
        &mut self,
        database: &DatabaseConfig,
        category: Category,
        file_count: usize,
    ) {
        self.events.push(ReportEvent::CategoryStarted {
            database: database.name.clone(),
            category,
            file_count,
        });
    }

    fn category_missing(&mut self, database: &DatabaseConfig, category: Category, path: &Path) {
        self.events.push(ReportEvent::CategoryMissing {
            database: database.name.clone(),
            category,
            path: path.to_path_buf(),
        });
    }

    fn category_unreadable(
        &mut self,
        database: &DatabaseConfig,
        category: Category,
        message: &str,
    ) {
        self.events.push(ReportEvent::CategoryUnreadable {
            database: database.name.clone(),
            category,
            message: message.to_string(),
        });
    }

    fn script_finished(
        &mut self,
        database: &DatabaseConfig,
        script: &ScriptFile,
        outcome: &ScriptOutcome,
    ) {
        self.events.push(ReportEvent::ScriptFinished {
            database: database.name.clone(),
            category: script.category,
            script: script.name.clone(),
            outcome: outcome.clone(),
        });
    }

    fn database_finished(&mut self, summary: &DatabaseSummary) {
        self.events.push(ReportEvent::DatabaseFinished {
            summary: summary.clone(),
        });
    }
}
