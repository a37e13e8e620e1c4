//! Script source - discovers scripts under the scripts root

use std::path::{Path, PathBuf};

use crate::domain::result::{Error, Result};
use crate::domain::{Category, ScriptFile};

/// Extension (ASCII case-insensitive) of runnable scripts
const SCRIPT_EXTENSION: &str = "sql";

/// Scripts found for one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryScripts {
    /// The category subfolder does not exist
    Missing(PathBuf),
    /// Scripts in execution order
    Found(Vec<ScriptFile>),
}

impl CategoryScripts {
    pub fn len(&self) -> usize {
        match self {
            CategoryScripts::Missing(_) => 0,
            CategoryScripts::Found(scripts) => scripts.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reads script files from `<root>/<Category>/*.sql`
#[derive(Debug, Clone)]
pub struct ScriptSource {
    root: PathBuf,
}

impl ScriptSource {
    /// Create a source without touching the filesystem
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create a source, failing if the root is not a readable directory
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::config(format!(
                "scripts folder {} does not exist or is not a directory",
                root.display()
            )));
        }
        std::fs::read_dir(&root).map_err(|e| {
            Error::config(format!("cannot read scripts folder {}: {}", root.display(), e))
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn category_path(&self, category: Category) -> PathBuf {
        self.root.join(category.folder_name())
    }

    /// List a category's scripts, sorted ascending by full path
    pub fn scripts(&self, category: Category) -> Result<CategoryScripts> {
        let dir = self.category_path(category);
        match std::fs::metadata(&dir) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(Error::Other(format!("{} is not a directory", dir.display())));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(CategoryScripts::Missing(dir));
            }
            Err(e) => return Err(e.into()),
        }

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_file() && is_script(&path) {
                paths.push(path);
            }
        }
        paths.sort_by(|a, b| a.to_string_lossy().cmp(&b.to_string_lossy()));

        Ok(CategoryScripts::Found(
            paths
                .into_iter()
                .map(|path| ScriptFile::new(category, path))
                .collect(),
        ))
    }
}

fn is_script(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(SCRIPT_EXTENSION))
        .unwrap_or(false)
}
