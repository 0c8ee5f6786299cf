//! Core runtime configuration.
//!
//! # Responsibility
//! - Collect host-provided path roots and fixed grid constants in one value.
//!
//! # Invariants
//! - Paths are supplied by the host platform; core never guesses them.
//! - `storage_key` and `dimensions` stay constant for the session lifetime.

use crate::model::grid::GridDimensions;
use std::path::PathBuf;

/// Key under which the whole grid snapshot is stored.
pub const DEFAULT_STORAGE_KEY: &str = "gridData";
/// File name used when the host does not choose one.
pub const DEFAULT_EXPORT_FILE_NAME: &str = "Untitled1.xlsx";
/// Name of the single worksheet in exported workbooks.
pub const EXPORT_SHEET_NAME: &str = "Sheet1";

/// Session configuration handed to `GridSession::open`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// SQLite file holding the key-value store. `None` keeps state in memory.
    pub db_path: Option<PathBuf>,
    /// Directory exports are written to, typically the platform downloads dir.
    pub export_dir: PathBuf,
    pub export_file_name: String,
    pub dimensions: GridDimensions,
    pub storage_key: String,
}

impl CoreConfig {
    /// Builds a file-backed configuration with app defaults.
    pub fn new(db_path: impl Into<PathBuf>, export_dir: impl Into<PathBuf>) -> Self {
        Self {
            db_path: Some(db_path.into()),
            ..Self::in_memory(export_dir)
        }
    }

    /// Builds a configuration whose grid is not persisted across restarts.
    pub fn in_memory(export_dir: impl Into<PathBuf>) -> Self {
        Self {
            db_path: None,
            export_dir: export_dir.into(),
            export_file_name: DEFAULT_EXPORT_FILE_NAME.to_string(),
            dimensions: GridDimensions::DEFAULT,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }

    /// Full path of the default export target.
    pub fn default_export_path(&self) -> PathBuf {
        self.export_dir.join(&self.export_file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, DEFAULT_STORAGE_KEY};
    use crate::model::grid::GridDimensions;
    use std::path::Path;

    #[test]
    fn new_uses_app_defaults() {
        let config = CoreConfig::new("/data/grid.sqlite3", "/downloads");
        assert_eq!(config.dimensions, GridDimensions::new(10, 5));
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
        assert_eq!(
            config.default_export_path(),
            Path::new("/downloads/Untitled1.xlsx")
        );
    }

    #[test]
    fn in_memory_has_no_db_path() {
        assert!(CoreConfig::in_memory("/tmp").db_path.is_none());
    }
}
