//! Tests for per-operation connections to the same database file
//!
//! Every check, execute and record opens its own connection, so repeated
//! and overlapping opens must keep working.
//!
//! Run with: cargo test --test connection_retry_test -- --nocapture

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Instant;
use tempfile::TempDir;

use dbscript_core::adapters::duckdb::DuckDbEngine;
use dbscript_core::ports::{ExecutionLog, ScriptExecutor};
use dbscript_core::DatabaseConfig;

fn database(dir: &TempDir) -> DatabaseConfig {
    DatabaseConfig::new("main", dir.path().join("test.duckdb").to_string_lossy())
}

/// Many short-lived connections in a row, as one run makes
#[test]
fn test_sequential_connections() {
    let temp_dir = TempDir::new().unwrap();
    let db = database(&temp_dir);
    let engine = DuckDbEngine::default();

    for i in 0..5 {
        let start = Instant::now();
        let name = format!("{:03}.sql", i);
        assert!(!engine.has_run(&name, &db).unwrap());
        engine
            .execute(&format!("CREATE TABLE t{} (id INTEGER)", i), &db)
            .unwrap();
        engine.record_run(&name, &db).unwrap();
        println!("Script {}: checked, executed and recorded in {:?}", i, start.elapsed());
    }

    assert_eq!(engine.entries(&db).unwrap().len(), 5);
}

/// Readers checking the log at the same time all get an answer
#[test]
fn test_concurrent_log_checks() {
    let temp_dir = TempDir::new().unwrap();
    let db = database(&temp_dir);
    let engine = DuckDbEngine::default();
    engine.record_run("001.sql", &db).unwrap();

    let barrier = Arc::new(Barrier::new(3));
    let engine = Arc::new(engine);
    let db = Arc::new(db);

    let handles: Vec<_> = (0..3)
        .map(|i| {
            let barrier = Arc::clone(&barrier);
            let engine = Arc::clone(&engine);
            let db = Arc::clone(&db);
            thread::spawn(move || {
                barrier.wait();
                let result = engine.has_run("001.sql", &db);
                println!("Thread {}: {:?}", i, result);
                result.map_err(|e| e.to_string())
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), Ok(true));
    }
}
