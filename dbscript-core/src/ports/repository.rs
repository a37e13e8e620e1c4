//! Database-facing ports: script execution and the execution log

use crate::domain::result::Result;
use crate::domain::{DatabaseConfig, ExecutionLogEntry};

/// Runs script text against a target database.
///
/// Each call owns its connection: it is opened for the call and released
/// before returning, whether or not the script succeeded.
pub trait ScriptExecutor: Send + Sync {
    /// Execute the full script text as a single batch.
    ///
    /// Fails with `Error::Connection` when the database cannot be opened and
    /// `Error::Execution` when the engine rejects the script. Statements that
    /// ran before a failing one keep their effects.
    fn execute(&self, sql: &str, database: &DatabaseConfig) -> Result<()>;
}

/// Per-database record of executed script names
pub trait ExecutionLog: Send + Sync {
    /// Whether `script_name` is recorded for `database`.
    ///
    /// Always asks the database; answers are never cached between scripts.
    fn has_run(&self, script_name: &str, database: &DatabaseConfig) -> Result<bool>;

    /// Record `script_name` as executed.
    ///
    /// The insert is conditional: if the name is already present this fails
    /// with `Error::AlreadyRecorded` and leaves the log untouched.
    fn record_run(&self, script_name: &str, database: &DatabaseConfig) -> Result<()>;

    /// All entries for `database`, oldest first
    fn entries(&self, database: &DatabaseConfig) -> Result<Vec<ExecutionLogEntry>>;

    /// Remove an entry so the script runs again. Returns false if absent.
    fn forget(&self, script_name: &str, database: &DatabaseConfig) -> Result<bool>;
}
