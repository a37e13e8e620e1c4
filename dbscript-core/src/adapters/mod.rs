//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB for script execution and the execution log
//! - In-memory recording for the Reporter port

pub mod duckdb;
pub mod recording;
