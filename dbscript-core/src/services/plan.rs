//! Plan service - previews a run without executing or recording anything

use std::sync::Arc;

use serde::Serialize;
use sqlparser::dialect::DuckDbDialect;
use sqlparser::parser::Parser;

use crate::domain::{Category, DatabaseConfig, ScriptFile};
use crate::ports::ExecutionLog;
use crate::services::source::{CategoryScripts, ScriptSource};

/// Validate SQL syntax without touching a database.
///
/// Uses the DuckDB dialect. Returns the parser message on failure.
pub fn validate_sql_syntax(sql: &str) -> Result<(), String> {
    let dialect = DuckDbDialect {};
    Parser::parse_sql(&dialect, sql).map_err(|e| {
        let msg = e.to_string();
        msg.trim_start_matches("sql parser error: ").to_string()
    })?;
    Ok(())
}

/// What a run would do with one script
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlanStatus {
    /// Already in the execution log; would be skipped
    Applied,
    /// Would be executed
    Pending,
    /// The execution log could not be checked
    Unknown { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannedScript {
    pub category: Category,
    pub script_name: String,
    #[serde(flatten)]
    pub status: PlanStatus,
    /// Parser message when validation was requested and failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub syntax_error: Option<String>,
}

/// A category folder that exists but could not be listed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnreadableCategory {
    pub category: Category,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabasePlan {
    pub database_name: String,
    pub scripts: Vec<PlannedScript>,
    pub missing_categories: Vec<Category>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unreadable_categories: Vec<UnreadableCategory>,
}

impl DatabasePlan {
    pub fn pending(&self) -> usize {
        self.scripts
            .iter()
            .filter(|s| s.status == PlanStatus::Pending)
            .count()
    }

    pub fn applied(&self) -> usize {
        self.scripts
            .iter()
            .filter(|s| s.status == PlanStatus::Applied)
            .count()
    }

    pub fn syntax_errors(&self) -> usize {
        self.scripts.iter().filter(|s| s.syntax_error.is_some()).count()
    }
}

/// Builds [`DatabasePlan`]s from the script source and the execution log
pub struct PlanService {
    source: ScriptSource,
    log: Arc<dyn ExecutionLog>,
}

impl PlanService {
    pub fn new(source: ScriptSource, log: Arc<dyn ExecutionLog>) -> Self {
        Self { source, log }
    }

    /// Plan one database. Only reads: scripts are never executed or recorded.
    pub fn plan(&self, database: &DatabaseConfig, validate: bool) -> DatabasePlan {
        let mut plan = DatabasePlan {
            database_name: database.name.clone(),
            scripts: Vec::new(),
            missing_categories: Vec::new(),
            unreadable_categories: Vec::new(),
        };

        for category in Category::ALL {
            match self.source.scripts(category) {
                Ok(CategoryScripts::Found(scripts)) => {
                    for script in scripts {
                        plan.scripts.push(self.plan_script(script, database, validate));
                    }
                }
                Ok(CategoryScripts::Missing(_)) => plan.missing_categories.push(category),
                Err(e) => plan.unreadable_categories.push(UnreadableCategory {
                    category,
                    message: e.to_string(),
                }),
            }
        }

        plan
    }

    fn plan_script(
        &self,
        script: ScriptFile,
        database: &DatabaseConfig,
        validate: bool,
    ) -> PlannedScript {
        let status = match self.log.has_run(&script.name, database) {
            Ok(true) => PlanStatus::Applied,
            Ok(false) => PlanStatus::Pending,
            Err(e) => PlanStatus::Unknown {
                message: e.to_string(),
            },
        };

        // Applied scripts will not run again, so their syntax is moot
        let syntax_error = if validate && status != PlanStatus::Applied {
            match script.read() {
                Ok(sql) => validate_sql_syntax(&sql).err(),
                Err(e) => Some(e.to_string()),
            }
        } else {
            None
        };

        PlannedScript {
            category: script.category,
            script_name: script.name,
            status,
            syntax_error,
        }
    }
}
