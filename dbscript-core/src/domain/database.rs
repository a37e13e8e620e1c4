use serde::{Deserialize, Serialize};

/// A target database, as supplied by configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConfig {
    pub name: String,
    /// For DuckDB this is the path of the database file
    pub connection_string: String,
}

impl DatabaseConfig {
    pub fn new(name: impl Into<String>, connection_string: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            connection_string: connection_string.into(),
        }
    }
}
