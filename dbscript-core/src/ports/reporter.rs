//! Reporter port - structured progress events for presentation layers

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::{Category, DatabaseConfig, DatabaseSummary, ScriptFile, ScriptOutcome};

/// Receives progress events while databases are processed.
///
/// The core never writes to the terminal itself. The CLI renders these
/// events with colors; tests and `--json` output record them.
/// Every method has a no-op default.
pub trait Reporter {
    fn database_started(&mut self, _database: &DatabaseConfig) {}

    fn category_started(
        &mut self,
        _database: &DatabaseConfig,
        _category: Category,
        _file_count: usize,
    ) {
    }

    /// The category subfolder does not exist; it contributes no files
    fn category_missing(&mut self, _database: &DatabaseConfig, _category: Category, _path: &Path) {}

    /// The category subfolder exists but could not be listed
    fn category_unreadable(
        &mut self,
        _database: &DatabaseConfig,
        _category: Category,
        _message: &str,
    ) {
    }

    fn script_finished(
        &mut self,
        _database: &DatabaseConfig,
        _script: &ScriptFile,
        _outcome: &ScriptOutcome,
    ) {
    }

    fn database_finished(&mut self, _summary: &DatabaseSummary) {}
}

/// Reporter that ignores every event
#[derive(Debug, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {}

/// A reporter event as data
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReportEvent {
    DatabaseStarted {
        database: String,
    },
    CategoryStarted {
        database: String,
        category: Category,
        file_count: usize,
    },
    CategoryMissing {
        database: String,
        category: Category,
        path: PathBuf,
    },
    CategoryUnreadable {
        database: String,
        category: Category,
        message: String,
    },
    ScriptFinished {
        database: String,
        category: Category,
        script: String,
        #[serde(flatten)]
        outcome: ScriptOutcome,
    },
    DatabaseFinished {
        summary: DatabaseSummary,
    },
}
