//! dbscript CLI - run categorized SQL scripts exactly once per database

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{forget, history, logs, plan, run};

/// dbscript - run SQL scripts against DuckDB databases, once each
#[derive(Parser)]
#[command(name = "dbscript", version, about, long_about = None)]
struct Cli {
    /// Path to the JSON config file
    #[arg(long, global = true, env = "DBSCRIPT_CONFIG", default_value = "dbscript.json")]
    config: PathBuf,

    /// Override the scripts folder from the config file
    #[arg(long, global = true)]
    scripts_folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute pending scripts against every configured database
    Run {
        /// Only process these databases (repeatable)
        #[arg(long = "database", short = 'd')]
        databases: Vec<String>,
        /// Output events and summaries as JSON
        #[arg(long)]
        json: bool,
        /// Exit with status 1 when any script failed or was not recorded
        #[arg(long)]
        strict: bool,
    },

    /// Show what a run would do without executing anything
    Plan {
        /// Only plan these databases (repeatable)
        #[arg(long = "database", short = 'd')]
        databases: Vec<String>,
        /// Check pending scripts for syntax errors
        #[arg(long)]
        validate: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the execution log of a database
    History {
        /// Database name from the config file
        database: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove a script from a database's execution log so it runs again
    Forget {
        /// Database name from the config file
        database: String,
        /// Script file name, e.g. 001_create_emp.sql
        script: String,
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    output::init_colors();

    match dispatch(cli) {
        Ok(code) => code,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn dispatch(cli: Cli) -> Result<ExitCode> {
    let source = commands::ConfigSource {
        path: cli.config,
        scripts_folder: cli.scripts_folder,
    };

    match cli.command {
        Commands::Run {
            databases,
            json,
            strict,
        } => run::run(&source, &databases, json, strict),
        Commands::Plan {
            databases,
            validate,
            json,
        } => plan::run(&source, &databases, validate, json).map(|()| ExitCode::SUCCESS),
        Commands::History { database, json } => {
            history::run(&source, &database, json).map(|()| ExitCode::SUCCESS)
        }
        Commands::Forget {
            database,
            script,
            force,
        } => forget::run(&source, &database, &script, force).map(|()| ExitCode::SUCCESS),
        Commands::Logs { command } => logs::run(command).map(|()| ExitCode::SUCCESS),
    }
}
