//! dbscript Core - run categorized SQL scripts exactly once per database
//!
//! This crate follows hexagonal architecture:
//!
//! - **domain**: Categories, scripts, databases and outcomes
//! - **ports**: Trait definitions for the engine, the execution log and reporting
//! - **services**: Script discovery, per-database processing, batch runs, plans
//! - **adapters**: Concrete implementations (DuckDB, recording reporter)
//!
//! Scripts live under `<scriptsFolder>/{Tables,Views,Functions,StoredProcedures,UDTs}/*.sql`.
//! Categories run in that order and scripts within a category in ascending
//! lexical order. A script whose file name is in a database's execution log
//! is skipped for that database.
//!
//! Runs are sequential and assume a single invocation per database at a
//! time: two concurrent runs can both execute a script before either records
//! it. The second write then surfaces as an `Unrecorded` outcome.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod ports;
pub mod services;

use std::sync::Arc;

use adapters::duckdb::DuckDbEngine;
use config::Config;
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{Error, Result};
pub use domain::{
    Category, DatabaseConfig, DatabaseSummary, ExecutionLogEntry, FailureStage, ScriptFile,
    ScriptOutcome,
};
pub use ports::{ReportEvent, Reporter};
pub use services::{LogEntry, LogEvent, LoggingService};

/// Main context for dbscript operations
///
/// Holds the validated configuration and the services built on the DuckDB
/// engine.
pub struct RunnerContext {
    pub config: Config,
    pub engine: Arc<DuckDbEngine>,
    pub batch_runner: BatchRunner,
    pub plan_service: PlanService,
}

impl RunnerContext {
    /// Build a context from configuration.
    ///
    /// Fails with a configuration error when the scripts folder is missing or
    /// unreadable; no database is touched.
    pub fn new(config: Config) -> Result<Self> {
        let source = ScriptSource::open(&config.scripts_folder)?;
        let engine = Arc::new(DuckDbEngine::new(&config.log_table)?);

        let processor = DatabaseProcessor::new(source.clone(), engine.clone(), engine.clone());
        let batch_runner = BatchRunner::new(processor);
        let plan_service = PlanService::new(source, engine.clone());

        Ok(Self {
            config,
            engine,
            batch_runner,
            plan_service,
        })
    }

    /// Run the batch over the selected databases (all when `names` is empty)
    pub fn run(&self, names: &[String], reporter: &mut dyn Reporter) -> Result<BatchReport> {
        let databases = self.config.select_databases(names)?;
        Ok(self.batch_runner.run(&databases, reporter))
    }

    /// Plan the selected databases (all when `names` is empty)
    pub fn plan(&self, names: &[String], validate: bool) -> Result<Vec<DatabasePlan>> {
        let databases = self.config.select_databases(names)?;
        Ok(databases
            .iter()
            .map(|database| self.plan_service.plan(database, validate))
            .collect())
    }
}
