//! Service layer - script discovery and run orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on one step of a run.

mod batch;
pub mod logging;
mod plan;
mod processor;
mod source;

pub use batch::{BatchReport, BatchRunner};
pub use logging::{LogEntry, LogEvent, LoggingService};
pub use plan::{
    validate_sql_syntax, DatabasePlan, PlanService, PlanStatus, PlannedScript,
    UnreadableCategory,
};
pub use processor::DatabaseProcessor;
pub use source::{CategoryScripts, ScriptSource};
