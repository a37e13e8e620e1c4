//! Script files and execution log entries

use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::Category;
use super::result::{Error, Result};

/// A script discovered under the scripts root.
///
/// The file name is the key used in the execution log. Content is only read
/// when the script is about to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptFile {
    pub category: Category,
    pub name: String,
    pub path: PathBuf,
}

impl ScriptFile {
    pub fn new(category: Category, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            category,
            name,
            path,
        }
    }

    /// Read the script text from disk
    pub fn read(&self) -> Result<String> {
        std::fs::read_to_string(&self.path).map_err(|source| Error::ScriptRead {
            path: self.path.display().to_string(),
            source,
        })
    }
}

/// One row of a database's execution log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
    pub script_name: String,
    pub executed_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_name_is_file_name() {
        let script = ScriptFile::new(Category::Tables, "/scripts/Tables/001_create_emp.sql");
        assert_eq!(script.name, "001_create_emp.sql");
        assert_eq!(script.category, Category::Tables);
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempdir().unwrap();
        let script = ScriptFile::new(Category::Views, dir.path().join("nope.sql"));
        let err = script.read().unwrap_err();
        assert!(matches!(err, Error::ScriptRead { .. }));
    }

    #[test]
    fn test_read_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("001.sql");
        std::fs::write(&path, "CREATE TABLE t (id INTEGER);").unwrap();

        let script = ScriptFile::new(Category::Tables, &path);
        assert_eq!(script.read().unwrap(), "CREATE TABLE t (id INTEGER);");
    }
}
