//! Script categories

use std::fmt;

use serde::{Deserialize, Serialize};

/// A fixed script-type subfolder of the scripts root.
///
/// Categories are the coarse execution order: table DDL runs before the
/// views, functions and procedures that reference it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Tables,
    Views,
    Functions,
    StoredProcedures,
    #[serde(rename = "UDTs")]
    Udts,
}

impl Category {
    /// All categories in execution order
    pub const ALL: [Category; 5] = [
        Category::Tables,
        Category::Views,
        Category::Functions,
        Category::StoredProcedures,
        Category::Udts,
    ];

    /// Name of the subfolder holding this category's scripts
    pub fn folder_name(&self) -> &'static str {
        match self {
            Category::Tables => "Tables",
            Category::Views => "Views",
            Category::Functions => "Functions",
            Category::StoredProcedures => "StoredProcedures",
            Category::Udts => "UDTs",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.folder_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_order() {
        let names: Vec<&str> = Category::ALL.iter().map(|c| c.folder_name()).collect();
        assert_eq!(
            names,
            vec!["Tables", "Views", "Functions", "StoredProcedures", "UDTs"]
        );
    }

    #[test]
    fn test_serializes_as_folder_name() {
        assert_eq!(serde_json::to_string(&Category::Udts).unwrap(), "\"UDTs\"");
        assert_eq!(
            serde_json::to_string(&Category::StoredProcedures).unwrap(),
            "\"StoredProcedures\""
        );
    }
}
