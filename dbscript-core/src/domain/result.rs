//! Result and error types for the core library

use thiserror::Error;

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Log read error: {0}")]
    LogRead(String),

    #[error("Log write error: {0}")]
    LogWrite(String),

    #[error("Script '{0}' is already recorded in the execution log")]
    AlreadyRecorded(String),

    #[error("Cannot read script {path}: {source}")]
    ScriptRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create an execution error
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Create a log write error
    pub fn log_write(msg: impl Into<String>) -> Self {
        Self::LogWrite(msg.into())
    }

    /// Create a log read error
    pub fn log_read(msg: impl Into<String>) -> Self {
        Self::LogRead(msg.into())
    }

    /// True for errors that abort a run before any database is touched
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;
