//! Batch runner - processes every configured database in order

use serde::Serialize;

use crate::domain::{DatabaseConfig, DatabaseSummary};
use crate::ports::Reporter;
use crate::services::processor::DatabaseProcessor;

/// Summaries for one invocation, in configured database order
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub databases: Vec<DatabaseSummary>,
}

impl BatchReport {
    /// True when any script failed or ran without being recorded
    pub fn has_failures(&self) -> bool {
        self.databases.iter().any(|s| s.has_problems())
    }

    /// Counters summed across databases
    pub fn totals(&self) -> DatabaseSummary {
        let mut totals = DatabaseSummary::new("Total");
        for summary in &self.databases {
            totals.total_files += summary.total_files;
            totals.executed_files += summary.executed_files;
            totals.skipped_files += summary.skipped_files;
            totals.failed_files += summary.failed_files;
            totals.unrecorded_files += summary.unrecorded_files;
        }
        totals
    }
}

/// Runs a [`DatabaseProcessor`] over a list of databases, one at a time
pub struct BatchRunner {
    processor: DatabaseProcessor,
}

impl BatchRunner {
    pub fn new(processor: DatabaseProcessor) -> Self {
        Self { processor }
    }

    /// Process each database sequentially.
    ///
    /// Never stops early: a database whose every script failed still gets a
    /// summary and the next database is processed.
    pub fn run(&self, databases: &[DatabaseConfig], reporter: &mut dyn Reporter) -> BatchReport {
        let databases = databases
            .iter()
            .map(|database| self.processor.process(database, reporter))
            .collect();
        BatchReport { databases }
    }
}
