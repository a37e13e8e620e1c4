//! Per-script outcomes and per-database tallies

use serde::{Deserialize, Serialize};

use super::Category;

/// Where a failed script stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// Checking the execution log
    LogCheck,
    /// Reading the script file
    Read,
    /// Running the script against the database
    Execute,
}

/// Outcome of processing one script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScriptOutcome {
    /// Ran and was recorded in the execution log
    Executed,
    /// Already present in the execution log
    Skipped,
    /// Did not run to completion; not recorded
    Failed { stage: FailureStage, message: String },
    /// Ran, but recording it failed. The next invocation will run it again.
    Unrecorded { message: String },
}

impl ScriptOutcome {
    pub fn failed(stage: FailureStage, message: impl Into<String>) -> Self {
        Self::Failed {
            stage,
            message: message.into(),
        }
    }

    /// True when the script's statements reached the database
    pub fn ran(&self) -> bool {
        matches!(self, Self::Executed | Self::Unrecorded { .. })
    }

    /// True for outcomes that need operator attention
    pub fn is_problem(&self) -> bool {
        matches!(self, Self::Failed { .. } | Self::Unrecorded { .. })
    }
}

/// Aggregate counters for one database.
///
/// `total_files == executed_files + skipped_files + failed_files` always
/// holds; `unrecorded_files` is a subset of `executed_files`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSummary {
    pub database_name: String,
    pub total_files: usize,
    pub executed_files: usize,
    pub skipped_files: usize,
    pub failed_files: usize,
    pub unrecorded_files: usize,
    pub missing_categories: Vec<Category>,
}

impl DatabaseSummary {
    pub fn new(database_name: impl Into<String>) -> Self {
        Self {
            database_name: database_name.into(),
            ..Default::default()
        }
    }

    /// Count one script outcome
    pub fn record(&mut self, outcome: &ScriptOutcome) {
        self.total_files += 1;
        match outcome {
            ScriptOutcome::Executed => self.executed_files += 1,
            ScriptOutcome::Skipped => self.skipped_files += 1,
            ScriptOutcome::Failed { .. } => self.failed_files += 1,
            ScriptOutcome::Unrecorded { .. } => {
                self.executed_files += 1;
                self.unrecorded_files += 1;
            }
        }
    }

    pub fn has_problems(&self) -> bool {
        self.failed_files > 0 || self.unrecorded_files > 0
    }

    /// Check the tally invariant
    pub fn is_consistent(&self) -> bool {
        self.total_files == self.executed_files + self.skipped_files + self.failed_files
            && self.unrecorded_files <= self.executed_files
    }
}
