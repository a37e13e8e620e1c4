//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The processing
//! logic depends only on these traits, not on concrete implementations.

mod reporter;
mod repository;

pub use reporter::{NullReporter, ReportEvent, Reporter};
pub use repository::{ExecutionLog, ScriptExecutor};
