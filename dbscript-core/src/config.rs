//! Configuration management
//!
//! Runs are described by a JSON file:
//! ```json
//! {
//!   "scriptsFolder": "scripts",
//!   "databases": [
//!     { "name": "main", "connectionString": "data/main.duckdb" }
//!   ],
//!   "logTable": "sys_script_log"
//! }
//! ```
//! `scriptsFolder` and `databases` are required. A relative `scriptsFolder`
//! is resolved against the directory holding the config file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::adapters::duckdb::{is_valid_identifier, DEFAULT_LOG_TABLE};
use crate::domain::result::{Error, Result};
use crate::domain::DatabaseConfig;

/// Environment variable overriding `scriptsFolder`
pub const SCRIPTS_FOLDER_ENV: &str = "DBSCRIPT_SCRIPTS_FOLDER";

/// Raw config file structure. Every field is optional here so that a
/// missing setting is reported by name rather than as a serde error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    #[serde(default)]
    scripts_folder: Option<String>,
    #[serde(default)]
    databases: Option<Vec<DatabaseEntry>>,
    #[serde(default)]
    log_table: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DatabaseEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    connection_string: Option<String>,
}

/// Validated run configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub scripts_folder: PathBuf,
    /// Target databases in processing order
    pub databases: Vec<DatabaseConfig>,
    pub log_table: String,
}

impl Config {
    /// Load and validate a config file
    ///
    /// `DBSCRIPT_SCRIPTS_FOLDER` replaces the file's `scriptsFolder` when set.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("cannot read config file {}: {}", path.display(), e))
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut config = Self::from_json(&content, base_dir)?;

        if let Ok(folder) = std::env::var(SCRIPTS_FOLDER_ENV) {
            if !folder.trim().is_empty() {
                config.scripts_folder = PathBuf::from(folder);
            }
        }

        Ok(config)
    }

    /// Parse and validate config JSON, resolving relative paths against `base_dir`
    pub fn from_json(content: &str, base_dir: &Path) -> Result<Self> {
        let raw: ConfigFile = serde_json::from_str(content)
            .map_err(|e| Error::config(format!("malformed config: {}", e)))?;

        let scripts_folder = match raw.scripts_folder.as_deref().map(str::trim) {
            Some(folder) if !folder.is_empty() => base_dir.join(folder),
            _ => return Err(Error::config("missing required setting 'scriptsFolder'")),
        };

        let entries = raw
            .databases
            .ok_or_else(|| Error::config("missing required setting 'databases'"))?;
        if entries.is_empty() {
            return Err(Error::config("'databases' must list at least one database"));
        }

        let mut seen = HashSet::new();
        let mut databases = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            let name = entry
                .name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .ok_or_else(|| Error::config(format!("databases[{}] is missing 'name'", index)))?;
            let connection_string = entry
                .connection_string
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .ok_or_else(|| {
                    Error::config(format!(
                        "database '{}' is missing 'connectionString'",
                        name
                    ))
                })?;
            if !seen.insert(name.clone()) {
                return Err(Error::config(format!("database '{}' is listed twice", name)));
            }
            databases.push(DatabaseConfig {
                name,
                connection_string,
            });
        }

        let log_table = raw
            .log_table
            .unwrap_or_else(|| DEFAULT_LOG_TABLE.to_string());
        if !is_valid_identifier(&log_table) {
            return Err(Error::config(format!(
                "invalid 'logTable' value '{}'",
                log_table
            )));
        }

        Ok(Self {
            scripts_folder,
            databases,
            log_table,
        })
    }

    /// Override the scripts folder (e.g. from a command-line flag)
    pub fn with_scripts_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.scripts_folder = folder.into();
        self
    }

    /// Look up a configured database by name
    pub fn database(&self, name: &str) -> Result<&DatabaseConfig> {
        self.databases
            .iter()
            .find(|db| db.name == name)
            .ok_or_else(|| Error::config(format!("no database named '{}' is configured", name)))
    }

    /// Keep only the named databases, preserving configured order.
    /// An empty selection keeps everything.
    pub fn select_databases(&self, names: &[String]) -> Result<Vec<DatabaseConfig>> {
        if names.is_empty() {
            return Ok(self.databases.clone());
        }
        for name in names {
            self.database(name)?;
        }
        Ok(self
            .databases
            .iter()
            .filter(|db| names.contains(&db.name))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "scriptsFolder": "scripts",
        "databases": [
            { "name": "main", "connectionString": "data/main.duckdb" },
            { "name": "reporting", "connectionString": "data/reporting.duckdb" }
        ]
    }"#;

    #[test]
    fn test_valid_config() {
        let config = Config::from_json(VALID, Path::new("/deploy")).unwrap();
        assert_eq!(config.scripts_folder, PathBuf::from("/deploy/scripts"));
        assert_eq!(config.databases.len(), 2);
        assert_eq!(config.databases[0].name, "main");
        assert_eq!(config.databases[1].connection_string, "data/reporting.duckdb");
        assert_eq!(config.log_table, DEFAULT_LOG_TABLE);
    }

    #[test]
    fn test_absolute_scripts_folder_kept() {
        let json = r#"{"scriptsFolder": "/srv/sql",
            "databases": [{"name": "a", "connectionString": "a.duckdb"}]}"#;
        let config = Config::from_json(json, Path::new("/deploy")).unwrap();
        assert_eq!(config.scripts_folder, PathBuf::from("/srv/sql"));
    }

    #[test]
    fn test_missing_scripts_folder() {
        let json = r#"{"databases": [{"name": "a", "connectionString": "a.duckdb"}]}"#;
        let err = Config::from_json(json, Path::new(".")).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("scriptsFolder"));
    }

    #[test]
    fn test_missing_databases() {
        let err = Config::from_json(r#"{"scriptsFolder": "s"}"#, Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("databases"));

        let err = Config::from_json(r#"{"scriptsFolder": "s", "databases": []}"#, Path::new("."))
            .unwrap_err();
        assert!(err.to_string().contains("at least one"));
    }

    #[test]
    fn test_database_missing_fields() {
        let json = r#"{"scriptsFolder": "s", "databases": [{"connectionString": "a.duckdb"}]}"#;
        let err = Config::from_json(json, Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("databases[0]"));

        let json =
            r#"{"scriptsFolder": "s", "databases": [{"name": "a", "connectionString": " "}]}"#;
        let err = Config::from_json(json, Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("connectionString"));
    }

    #[test]
    fn test_duplicate_database_names() {
        let json = r#"{"scriptsFolder": "s", "databases": [
            {"name": "a", "connectionString": "a.duckdb"},
            {"name": "a", "connectionString": "b.duckdb"}
        ]}"#;
        let err = Config::from_json(json, Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("listed twice"));
    }

    // Only test that reads or writes DBSCRIPT_SCRIPTS_FOLDER
    #[test]
    fn test_load_from_file_and_env_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dbscript.json");
        std::fs::write(&path, VALID).unwrap();
        let previous = std::env::var_os(SCRIPTS_FOLDER_ENV);

        std::env::remove_var(SCRIPTS_FOLDER_ENV);
        let config = Config::load(&path).unwrap();
        assert_eq!(config.scripts_folder, dir.path().join("scripts"));
        assert_eq!(config.databases.len(), 2);

        std::env::set_var(SCRIPTS_FOLDER_ENV, "/srv/override");
        let overridden = Config::load(&path);

        std::env::set_var(SCRIPTS_FOLDER_ENV, "  ");
        let blank = Config::load(&path);

        match previous {
            Some(value) => std::env::set_var(SCRIPTS_FOLDER_ENV, value),
            None => std::env::remove_var(SCRIPTS_FOLDER_ENV),
        }

        assert_eq!(
            overridden.unwrap().scripts_folder,
            PathBuf::from("/srv/override")
        );
        assert_eq!(blank.unwrap().scripts_folder, dir.path().join("scripts"));
    }

    #[test]
    fn test_malformed_json() {
        let err = Config::from_json("{ not json", Path::new(".")).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("malformed"));
    }

    #[test]
    fn test_invalid_log_table() {
        let json = r#"{"scriptsFolder": "s", "logTable": "x; DROP TABLE y",
            "databases": [{"name": "a", "connectionString": "a.duckdb"}]}"#;
        assert!(Config::from_json(json, Path::new(".")).is_err());
    }

    #[test]
    fn test_select_databases_keeps_config_order() {
        let config = Config::from_json(VALID, Path::new(".")).unwrap();

        let all = config.select_databases(&[]).unwrap();
        assert_eq!(all.len(), 2);

        let picked = config
            .select_databases(&["reporting".to_string(), "main".to_string()])
            .unwrap();
        let names: Vec<&str> = picked.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["main", "reporting"]);

        assert!(config.select_databases(&["nope".to_string()]).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/definitely/not/here/dbscript.json")).unwrap_err();
        assert!(err.is_fatal());
    }
}
