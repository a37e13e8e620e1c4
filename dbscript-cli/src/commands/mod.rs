//! CLI command implementations

pub mod forget;
pub mod history;
pub mod logs;
pub mod plan;
pub mod run;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use dbscript_core::config::Config;
use dbscript_core::{LogEvent, LoggingService, RunnerContext};

/// Where the configuration comes from, as given on the command line
pub struct ConfigSource {
    pub path: PathBuf,
    pub scripts_folder: Option<PathBuf>,
}

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let state_dir = get_state_dir().ok()?;
    std::fs::create_dir_all(&state_dir).ok()?;
    LoggingService::new(&state_dir, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break a run)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Get the state directory from environment or default
pub fn get_state_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("DBSCRIPT_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".dbscript"))
        .ok_or_else(|| anyhow!("Could not find home directory; set DBSCRIPT_DIR"))
}

/// Load the config file, applying the `--scripts-folder` override
pub fn load_config(source: &ConfigSource) -> Result<Config> {
    let config = Config::load(&source.path)
        .with_context(|| format!("Failed to load config from {}", source.path.display()))?;

    Ok(match &source.scripts_folder {
        Some(folder) => config.with_scripts_folder(folder),
        None => config,
    })
}

/// Load configuration and build the runner context
pub fn get_context(source: &ConfigSource) -> Result<RunnerContext> {
    let config = load_config(source)?;
    RunnerContext::new(config).context("Failed to initialize dbscript")
}
