//! DuckDB adapter - script execution and the per-database execution log
//!
//! A database's connection string is the path of its DuckDB file. Every
//! operation opens its own connection and drops it before returning, so a
//! log check, a script execution and a log write are three separate
//! connection lifetimes.

use std::path::Path;
use std::thread;
use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use duckdb::{params, Connection};

use crate::domain::result::{Error, Result};
use crate::domain::{DatabaseConfig, ExecutionLogEntry};
use crate::ports::{ExecutionLog, ScriptExecutor};

/// Log table used when configuration does not name one
pub const DEFAULT_LOG_TABLE: &str = "sys_script_log";

/// Maximum number of attempts when the database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Format used to write and read `executed_at`
const STORED_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
const READ_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("could not set lock on file")
}

/// Whether `name` can be spliced into SQL as an unquoted table name
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// DuckDB-backed script executor and execution log
#[derive(Debug, Clone)]
pub struct DuckDbEngine {
    log_table: String,
}

impl Default for DuckDbEngine {
    fn default() -> Self {
        Self {
            log_table: DEFAULT_LOG_TABLE.to_string(),
        }
    }
}

impl DuckDbEngine {
    /// Create an engine that keeps its execution log in `log_table`
    pub fn new(log_table: &str) -> Result<Self> {
        if !is_valid_identifier(log_table) {
            return Err(Error::config(format!(
                "invalid log table name '{}': use letters, digits and underscores",
                log_table
            )));
        }
        Ok(Self {
            log_table: log_table.to_string(),
        })
    }

    pub fn log_table(&self) -> &str {
        &self.log_table
    }

    /// Open a connection to `database`
    ///
    /// Retries with exponential backoff while the file is locked by another
    /// process.
    fn connect(&self, database: &DatabaseConfig) -> Result<Connection> {
        let mut attempt = 0;
        loop {
            match Self::try_open_connection(&database.connection_string) {
                Ok(conn) => return Ok(conn),
                Err(e) => {
                    let err_msg = e.to_string();
                    attempt += 1;
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt - 1));
                        eprintln!(
                            "[dbscript] Database '{}' busy, retrying in {}ms (attempt {}/{}): {}",
                            database.name,
                            delay.as_millis(),
                            attempt,
                            MAX_RETRIES,
                            err_msg
                        );
                        thread::sleep(delay);
                        continue;
                    }
                    return Err(Error::connection(format!(
                        "cannot open database '{}': {}",
                        database.name, err_msg
                    )));
                }
            }
        }
    }

    /// Open a connection for reading the log without creating the file.
    ///
    /// Returns `None` when the database file does not exist yet. A missing
    /// parent directory is still a connection error.
    fn connect_existing(&self, database: &DatabaseConfig) -> Result<Option<Connection>> {
        let path = Path::new(&database.connection_string);
        if database.connection_string.starts_with(":memory:") || path.exists() {
            return self.connect(database).map(Some);
        }
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
                Err(Error::connection(format!(
                    "cannot open database '{}': directory {} does not exist",
                    database.name,
                    parent.display()
                )))
            }
            _ => Ok(None),
        }
    }

    fn try_open_connection(path: &str) -> duckdb::Result<Connection> {
        // Cached extensions in ~/.duckdb/extensions are never loaded implicitly
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Connection::open_with_flags(path, config)
    }

    fn log_table_exists(&self, conn: &Connection) -> duckdb::Result<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables
             WHERE table_name = ? AND table_schema = current_schema()",
            [self.log_table.as_str()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn create_log_table(&self, conn: &Connection) -> duckdb::Result<()> {
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                script_name VARCHAR PRIMARY KEY,
                executed_at TIMESTAMP NOT NULL
            )",
            self.log_table
        ))
    }

    fn count_entries(&self, conn: &Connection, script_name: &str) -> duckdb::Result<i64> {
        conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE script_name = ?",
                self.log_table
            ),
            [script_name],
            |row| row.get(0),
        )
    }
}

impl ScriptExecutor for DuckDbEngine {
    fn execute(&self, sql: &str, database: &DatabaseConfig) -> Result<()> {
        let conn = self.connect(database)?;
        conn.execute_batch(sql)
            .map_err(|e| Error::execution(e.to_string()))?;

        // An open transaction is rolled back when the connection drops
        if !conn.is_autocommit() {
            let _ = conn.execute_batch("ROLLBACK");
            return Err(Error::execution("script left a transaction open"));
        }
        Ok(())
    }
}

impl ExecutionLog for DuckDbEngine {
    fn has_run(&self, script_name: &str, database: &DatabaseConfig) -> Result<bool> {
        let Some(conn) = self.connect_existing(database)? else {
            return Ok(false);
        };
        if !self
            .log_table_exists(&conn)
            .map_err(|e| Error::log_read(e.to_string()))?
        {
            return Ok(false);
        }
        let count = self
            .count_entries(&conn, script_name)
            .map_err(|e| Error::log_read(e.to_string()))?;
        Ok(count > 0)
    }

    fn record_run(&self, script_name: &str, database: &DatabaseConfig) -> Result<()> {
        let mut conn = self.connect(database)?;
        self.create_log_table(&conn)
            .map_err(|e| Error::log_write(e.to_string()))?;

        let executed_at = Utc::now()
            .naive_utc()
            .format(STORED_TIMESTAMP_FORMAT)
            .to_string();

        // Check and insert in one transaction; the primary key rejects a
        // concurrent writer that slips in between.
        let tx = conn
            .transaction()
            .map_err(|e| Error::log_write(e.to_string()))?;
        let existing = self
            .count_entries(&tx, script_name)
            .map_err(|e| Error::log_write(e.to_string()))?;
        if existing > 0 {
            return Err(Error::AlreadyRecorded(script_name.to_string()));
        }
        tx.execute(
            &format!(
                "INSERT INTO {} (script_name, executed_at) VALUES (?, CAST(? AS TIMESTAMP))",
                self.log_table
            ),
            params![script_name, executed_at],
        )
        .map_err(|e| Error::log_write(e.to_string()))?;
        tx.commit().map_err(|e| Error::log_write(e.to_string()))?;
        Ok(())
    }

    fn entries(&self, database: &DatabaseConfig) -> Result<Vec<ExecutionLogEntry>> {
        let Some(conn) = self.connect_existing(database)? else {
            return Ok(Vec::new());
        };
        if !self
            .log_table_exists(&conn)
            .map_err(|e| Error::log_read(e.to_string()))?
        {
            return Ok(Vec::new());
        }

        let mut stmt = conn
            .prepare(&format!(
                "SELECT script_name, strftime(executed_at, '{}')
                 FROM {}
                 ORDER BY executed_at, script_name",
                READ_TIMESTAMP_FORMAT, self.log_table
            ))
            .map_err(|e| Error::log_read(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(|e| Error::log_read(e.to_string()))?;

        let mut entries = Vec::new();
        for row in rows {
            let (script_name, executed_at) =
                row.map_err(|e| Error::log_read(e.to_string()))?;
            let executed_at = NaiveDateTime::parse_from_str(&executed_at, READ_TIMESTAMP_FORMAT)
                .map_err(|e| {
                    Error::log_read(format!(
                        "bad timestamp '{}' for {}: {}",
                        executed_at, script_name, e
                    ))
                })?;
            entries.push(ExecutionLogEntry {
                script_name,
                executed_at,
            });
        }
        Ok(entries)
    }

    fn forget(&self, script_name: &str, database: &DatabaseConfig) -> Result<bool> {
        let Some(conn) = self.connect_existing(database)? else {
            return Ok(false);
        };
        if !self
            .log_table_exists(&conn)
            .map_err(|e| Error::log_read(e.to_string()))?
        {
            return Ok(false);
        }
        let deleted = conn
            .execute(
                &format!("DELETE FROM {} WHERE script_name = ?", self.log_table),
                [script_name],
            )
            .map_err(|e| Error::log_write(e.to_string()))?;
        Ok(deleted > 0)
    }
}
