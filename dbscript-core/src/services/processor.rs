//! Database processor - runs every pending script against one database
//!
//! For each category in order, and each script in lexical order:
//! 1. Skip it if the execution log already has it
//! 2. Otherwise read and execute it
//! 3. Record it in the execution log
//!
//! A failing script is counted and reported; processing always continues
//! with the next script.

use std::sync::Arc;

use crate::domain::result::Error;
use crate::domain::{
    Category, DatabaseConfig, DatabaseSummary, FailureStage, ScriptFile, ScriptOutcome,
};
use crate::ports::{ExecutionLog, Reporter, ScriptExecutor};
use crate::services::source::{CategoryScripts, ScriptSource};

/// Processes the scripts of a [`ScriptSource`] against one database at a time
pub struct DatabaseProcessor {
    source: ScriptSource,
    executor: Arc<dyn ScriptExecutor>,
    log: Arc<dyn ExecutionLog>,
}

impl DatabaseProcessor {
    pub fn new(
        source: ScriptSource,
        executor: Arc<dyn ScriptExecutor>,
        log: Arc<dyn ExecutionLog>,
    ) -> Self {
        Self {
            source,
            executor,
            log,
        }
    }

    pub fn source(&self) -> &ScriptSource {
        &self.source
    }

    /// Process all categories for `database` and tally the outcomes
    pub fn process(
        &self,
        database: &DatabaseConfig,
        reporter: &mut dyn Reporter,
    ) -> DatabaseSummary {
        let mut summary = DatabaseSummary::new(&database.name);
        reporter.database_started(database);

        for category in Category::ALL {
            let scripts = match self.source.scripts(category) {
                Ok(CategoryScripts::Found(scripts)) => scripts,
                Ok(CategoryScripts::Missing(path)) => {
                    summary.missing_categories.push(category);
                    reporter.category_missing(database, category, &path);
                    continue;
                }
                Err(e) => {
                    reporter.category_unreadable(database, category, &e.to_string());
                    continue;
                }
            };

            reporter.category_started(database, category, scripts.len());
            for script in &scripts {
                let outcome = self.process_script(script, database);
                summary.record(&outcome);
                reporter.script_finished(database, script, &outcome);
            }
        }

        reporter.database_finished(&summary);
        summary
    }

    /// Decide, run and record a single script
    pub fn process_script(&self, script: &ScriptFile, database: &DatabaseConfig) -> ScriptOutcome {
        match self.log.has_run(&script.name, database) {
            Ok(true) => return ScriptOutcome::Skipped,
            Ok(false) => {}
            Err(e) => return ScriptOutcome::failed(FailureStage::LogCheck, e.to_string()),
        }

        let sql = match script.read() {
            Ok(sql) => sql,
            Err(e) => return ScriptOutcome::failed(FailureStage::Read, e.to_string()),
        };

        if let Err(e) = self.executor.execute(&sql, database) {
            return ScriptOutcome::failed(FailureStage::Execute, e.to_string());
        }

        match self.log.record_run(&script.name, database) {
            Ok(()) => ScriptOutcome::Executed,
            Err(e @ Error::AlreadyRecorded(_)) => ScriptOutcome::Unrecorded {
                message: format!("{} (another run recorded it concurrently)", e),
            },
            Err(e) => ScriptOutcome::Unrecorded {
                message: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;
    use std::sync::Mutex;

    use tempfile::{tempdir, TempDir};

    use crate::adapters::recording::RecordingReporter;
    use crate::domain::result::Result;
    use crate::domain::ExecutionLogEntry;

    /// In-memory engine: scripts containing `FAIL` are rejected, databases
    /// whose connection string is `offline` cannot be reached.
    #[derive(Default)]
    pub(crate) struct FakeEngine {
        pub executed: Mutex<Vec<(String, String)>>,
        pub logged: Mutex<HashSet<(String, String)>>,
        pub fail_writes: bool,
    }

    impl FakeEngine {
        fn check_online(database: &DatabaseConfig) -> Result<()> {
            if database.connection_string == "offline" {
                return Err(Error::connection(format!("{} is offline", database.name)));
            }
            Ok(())
        }

        pub fn executed_on(&self, database: &str) -> Vec<String> {
            self.executed
                .lock()
                .unwrap()
                .iter()
                .filter(|(db, _)| db == database)
                .map(|(_, sql)| sql.clone())
                .collect()
        }
    }

    impl ScriptExecutor for FakeEngine {
        fn execute(&self, sql: &str, database: &DatabaseConfig) -> Result<()> {
            Self::check_online(database)?;
            if sql.contains("FAIL") {
                return Err(Error::execution("syntax error at or near \"FAIL\""));
            }
            self.executed
                .lock()
                .unwrap()
                .push((database.name.clone(), sql.to_string()));
            Ok(())
        }
    }

    impl ExecutionLog for FakeEngine {
        fn has_run(&self, script_name: &str, database: &DatabaseConfig) -> Result<bool> {
            Self::check_online(database)?;
            Ok(self
                .logged
                .lock()
                .unwrap()
                .contains(&(database.name.clone(), script_name.to_string())))
        }

        fn record_run(&self, script_name: &str, database: &DatabaseConfig) -> Result<()> {
            Self::check_online(database)?;
            if self.fail_writes {
                return Err(Error::log_write("disk full"));
            }
            let inserted = self
                .logged
                .lock()
                .unwrap()
                .insert((database.name.clone(), script_name.to_string()));
            if !inserted {
                return Err(Error::AlreadyRecorded(script_name.to_string()));
            }
            Ok(())
        }

        fn entries(&self, _database: &DatabaseConfig) -> Result<Vec<ExecutionLogEntry>> {
            Ok(Vec::new())
        }

        fn forget(&self, script_name: &str, database: &DatabaseConfig) -> Result<bool> {
            Ok(self
                .logged
                .lock()
                .unwrap()
                .remove(&(database.name.clone(), script_name.to_string())))
        }
    }

    pub(crate) fn write_script(root: &TempDir, category: &str, name: &str, sql: &str) {
        let dir = root.path().join(category);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(name), sql).unwrap();
    }

    fn processor(root: &TempDir, engine: &Arc<FakeEngine>) -> DatabaseProcessor {
        DatabaseProcessor::new(
            ScriptSource::new(root.path()),
            engine.clone(),
            engine.clone(),
        )
    }

    #[test]
    fn test_categories_then_names() {
        let root = tempdir().unwrap();
        write_script(&root, "Views", "1_view.sql", "view");
        write_script(&root, "Tables", "2_create.sql", "create");
        write_script(&root, "Tables", "1_setup.sql", "setup");
        write_script(&root, "UDTs", "0_type.sql", "type");
        write_script(&root, "StoredProcedures", "proc.sql", "proc");
        write_script(&root, "Functions", "fn.sql", "fn");

        let engine = Arc::new(FakeEngine::default());
        let db = DatabaseConfig::new("main", "main.duckdb");
        let mut reporter = RecordingReporter::new();

        let summary = processor(&root, &engine).process(&db, &mut reporter);

        assert_eq!(
            reporter.ran_scripts(),
            vec!["1_setup.sql", "2_create.sql", "1_view.sql", "fn.sql", "proc.sql", "0_type.sql"]
        );
        assert_eq!(
            engine.executed_on("main"),
            vec!["setup", "create", "view", "fn", "proc", "type"]
        );
        assert_eq!(summary.total_files, 6);
        assert_eq!(summary.executed_files, 6);
        assert!(summary.missing_categories.is_empty());
    }

    #[test]
    fn test_second_run_skips_everything() {
        let root = tempdir().unwrap();
        write_script(&root, "Tables", "001.sql", "a");
        write_script(&root, "Views", "001.sql", "b");

        let engine = Arc::new(FakeEngine::default());
        let db = DatabaseConfig::new("main", "main.duckdb");
        let processor = processor(&root, &engine);

        processor.process(&db, &mut RecordingReporter::new());
        // Same file name in two categories shares one log entry
        assert_eq!(engine.executed_on("main"), vec!["a"]);

        let summary = processor.process(&db, &mut RecordingReporter::new());
        assert_eq!(summary.skipped_files, 2);
        assert_eq!(summary.executed_files, 0);
        assert_eq!(engine.executed_on("main").len(), 1);
    }

    #[test]
    fn test_failure_does_not_stop_batch() {
        let root = tempdir().unwrap();
        write_script(&root, "Tables", "001_ok.sql", "ok");
        write_script(&root, "Tables", "002_bad.sql", "FAIL");
        write_script(&root, "Tables", "003_ok.sql", "ok too");
        write_script(&root, "Views", "v.sql", "view");

        let engine = Arc::new(FakeEngine::default());
        let db = DatabaseConfig::new("main", "main.duckdb");
        let mut reporter = RecordingReporter::new();

        let summary = processor(&root, &engine).process(&db, &mut reporter);

        assert_eq!(summary.total_files, 4);
        assert_eq!(summary.executed_files, 3);
        assert_eq!(summary.failed_files, 1);
        assert!(summary.is_consistent());
        assert_eq!(
            reporter.ran_scripts(),
            vec!["001_ok.sql", "003_ok.sql", "v.sql"]
        );

        let outcomes = reporter.script_outcomes();
        assert!(matches!(
            &outcomes[1].1,
            ScriptOutcome::Failed { stage: FailureStage::Execute, .. }
        ));
        // Failed scripts are not recorded
        assert!(!engine.has_run("002_bad.sql", &db).unwrap());
    }

    #[test]
    fn test_failed_script_is_retried_next_run() {
        let root = tempdir().unwrap();
        write_script(&root, "Tables", "001_create_emp.sql", "create emp");
        write_script(&root, "Tables", "002_bad.sql", "FAIL");

        let engine = Arc::new(FakeEngine::default());
        let db = DatabaseConfig::new("main", "main.duckdb");
        let processor = processor(&root, &engine);

        let first = processor.process(&db, &mut RecordingReporter::new());
        assert_eq!(
            (first.total_files, first.executed_files, first.skipped_files, first.failed_files),
            (2, 1, 0, 1)
        );

        let second = processor.process(&db, &mut RecordingReporter::new());
        assert_eq!(
            (second.total_files, second.executed_files, second.skipped_files, second.failed_files),
            (2, 0, 1, 1)
        );
    }

    #[test]
    fn test_missing_category_contributes_nothing() {
        let root = tempdir().unwrap();
        write_script(&root, "Tables", "001.sql", "t");

        let engine = Arc::new(FakeEngine::default());
        let db = DatabaseConfig::new("main", "main.duckdb");
        let mut reporter = RecordingReporter::new();

        let summary = processor(&root, &engine).process(&db, &mut reporter);

        assert_eq!(summary.total_files, 1);
        assert_eq!(summary.executed_files, 1);
        assert_eq!(
            summary.missing_categories,
            vec![Category::Views, Category::Functions, Category::StoredProcedures, Category::Udts]
        );
        assert_eq!(reporter.missing_categories(), summary.missing_categories);
    }

    #[test]
    fn test_unreadable_category_is_reported_and_skipped() {
        let root = tempdir().unwrap();
        write_script(&root, "Tables", "001.sql", "t");
        fs::write(root.path().join("Views"), "not a folder").unwrap();
        write_script(&root, "Functions", "f.sql", "f");

        let engine = Arc::new(FakeEngine::default());
        let db = DatabaseConfig::new("main", "main.duckdb");
        let mut reporter = RecordingReporter::new();

        let summary = processor(&root, &engine).process(&db, &mut reporter);

        assert_eq!(summary.total_files, 2);
        assert_eq!(summary.executed_files, 2);
        assert!(summary.is_consistent());
        assert!(!summary.missing_categories.contains(&Category::Views));
        assert!(reporter.events.iter().any(|event| matches!(
            event,
            crate::ports::ReportEvent::CategoryUnreadable { category: Category::Views, .. }
        )));
        assert_eq!(reporter.ran_scripts(), vec!["001.sql", "f.sql"]);
    }

    #[test]
    fn test_log_write_failure_is_unrecorded() {
        let root = tempdir().unwrap();
        write_script(&root, "Tables", "001.sql", "t");

        let engine = Arc::new(FakeEngine {
            fail_writes: true,
            ..Default::default()
        });
        let db = DatabaseConfig::new("main", "main.duckdb");

        let summary = processor(&root, &engine).process(&db, &mut RecordingReporter::new());

        assert_eq!(summary.executed_files, 1);
        assert_eq!(summary.unrecorded_files, 1);
        assert_eq!(summary.failed_files, 0);
        assert!(summary.has_problems());
        assert!(summary.is_consistent());
    }

    #[test]
    fn test_concurrent_record_is_unrecorded() {
        let root = tempdir().unwrap();
        write_script(&root, "Tables", "001.sql", "t");
        let script = ScriptFile::new(Category::Tables, root.path().join("Tables").join("001.sql"));

        let engine = Arc::new(FakeEngine::default());
        let db = DatabaseConfig::new("main", "main.duckdb");
        let processor = processor(&root, &engine);

        // Simulate another invocation recording between our check and write
        struct RacingLog(Arc<FakeEngine>);
        impl ExecutionLog for RacingLog {
            fn has_run(&self, _: &str, _: &DatabaseConfig) -> Result<bool> {
                Ok(false)
            }
            fn record_run(&self, name: &str, db: &DatabaseConfig) -> Result<()> {
                self.0.record_run(name, db)?;
                self.0.record_run(name, db)
            }
            fn entries(&self, db: &DatabaseConfig) -> Result<Vec<ExecutionLogEntry>> {
                self.0.entries(db)
            }
            fn forget(&self, name: &str, db: &DatabaseConfig) -> Result<bool> {
                self.0.forget(name, db)
            }
        }
        let racing = DatabaseProcessor::new(
            processor.source().clone(),
            engine.clone(),
            Arc::new(RacingLog(engine.clone())),
        );

        match racing.process_script(&script, &db) {
            ScriptOutcome::Unrecorded { message } => assert!(message.contains("concurrently")),
            other => panic!("expected unrecorded, got {:?}", other),
        }
    }

    #[test]
    fn test_unreachable_database_fails_every_script() {
        let root = tempdir().unwrap();
        write_script(&root, "Tables", "001.sql", "t");
        write_script(&root, "Views", "v.sql", "v");

        let engine = Arc::new(FakeEngine::default());
        let db = DatabaseConfig::new("gone", "offline");
        let mut reporter = RecordingReporter::new();

        let summary = processor(&root, &engine).process(&db, &mut reporter);

        assert_eq!(summary.total_files, 2);
        assert_eq!(summary.failed_files, 2);
        assert!(reporter.script_outcomes().iter().all(|(_, o)| matches!(
            o,
            ScriptOutcome::Failed { stage: FailureStage::LogCheck, .. }
        )));
    }

    #[test]
    fn test_unreadable_script_fails_at_read() {
        let root = tempdir().unwrap();
        let engine = Arc::new(FakeEngine::default());
        let db = DatabaseConfig::new("main", "main.duckdb");
        let script = ScriptFile::new(Category::Tables, root.path().join("Tables").join("gone.sql"));

        let outcome = processor(&root, &engine).process_script(&script, &db);
        assert!(matches!(
            outcome,
            ScriptOutcome::Failed { stage: FailureStage::Read, .. }
        ));
    }

    #[test]
    fn test_logs_are_scoped_per_database() {
        let root = tempdir().unwrap();
        write_script(&root, "Tables", "001.sql", "t");

        let engine = Arc::new(FakeEngine::default());
        let a = DatabaseConfig::new("a", "a.duckdb");
        let b = DatabaseConfig::new("b", "b.duckdb");
        let processor = processor(&root, &engine);

        processor.process(&a, &mut RecordingReporter::new());
        let summary = processor.process(&b, &mut RecordingReporter::new());

        assert_eq!(summary.executed_files, 1);
        assert_eq!(summary.skipped_files, 0);
        assert_eq!(engine.executed_on("b"), vec!["t"]);
    }
}
