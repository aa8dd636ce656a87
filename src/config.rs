//! Runtime configuration from the environment.
//!
//! Values come from process environment variables, optionally seeded from a
//! `.env` file by the binary. Command-line flags override them.

use std::path::{Path, PathBuf};

pub const DATA_DIR_VAR: &str = "GRADEBOOK_DATA_DIR";
pub const USER_VAR: &str = "GRADEBOOK_USER";
pub const LOG_FILE_VAR: &str = "LOG_FILE_PATH";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub user_id: String,
    pub log_file_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            user_id: "local".to_string(),
            log_file_path: PathBuf::from("logs/gradebook.log"),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            data_dir: var(DATA_DIR_VAR).map(PathBuf::from).unwrap_or(defaults.data_dir),
            user_id: var(USER_VAR).unwrap_or(defaults.user_id),
            log_file_path: var(LOG_FILE_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.log_file_path),
        }
    }

    pub fn grades_path(&self) -> PathBuf {
        self.data_dir.join("grades.csv")
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir.join("preferences.json")
    }

    pub fn semesters_path(&self) -> PathBuf {
        self.data_dir.join("semesters.json")
    }

    pub fn log_dir(&self) -> &Path {
        self.log_file_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("logs"))
    }
}
