//! Core domain types
//!
//! Plain data: categories, scripts, target databases and outcomes.
//! No database or console I/O happens here.

mod category;
mod database;
pub mod result;
mod script;
mod summary;

pub use category::Category;
pub use database::DatabaseConfig;
pub use script::{ExecutionLogEntry, ScriptFile};
pub use summary::{DatabaseSummary, FailureStage, ScriptOutcome};
