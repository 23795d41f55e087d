//! Shared path utilities for peepal-cli

use std::path::PathBuf;

/// Get the base Peepal data directory.
pub fn get_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("PEEPAL_DATA_DIR") {
        return PathBuf::from(dir);
    }
    if let Some(home) = std::env::var_os("HOME") {
        return PathBuf::from(home).join(".peepal");
    }
    PathBuf::from(".peepal")
}

/// Get the database path
pub fn get_db_path() -> PathBuf {
    get_data_dir().join("peepal.db")
}

/// Get the config file path
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("peepal.toml")
}
