use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Directory for mutable state: the race database and the log file.
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join("wpm"))
        } else {
            ProjectDirs::from("", "", "wpm").map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn db_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("stats.db"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("wpm.log"))
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "wpm").map(|proj_dirs| proj_dirs.config_dir().join("config.json"))
    }
}
