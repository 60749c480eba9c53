// src/config.rs

//! Configuration loading utilities.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::Config;

/// Configuration file name inside the storage directory.
pub const CONFIG_FILE: &str = "config.toml";

pub fn config_path(storage_dir: &Path) -> PathBuf {
    storage_dir.join(CONFIG_FILE)
}

/// Load and validate the configuration of a storage directory.
///
/// A missing file means defaults. An unreadable file falls back to defaults
/// with a warning. Invalid values are an error.
pub fn load_config(storage_dir: &Path) -> Result<Config> {
    let path = config_path(storage_dir);
    let config = if path.exists() {
        Config::load_or_default(&path)
    } else {
        log::info!("No {} in {:?}; using defaults", CONFIG_FILE, storage_dir);
        Config::default()
    };
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.analysis.currency_threshold, 5000);
    }

    #[test]
    fn test_file_overrides_and_validation() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            config_path(tmp.path()),
            "[analysis]\ncurrency_threshold = 10\n",
        )
        .unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.analysis.currency_threshold, 10);
        assert_eq!(config.feed.reference_day, 12);

        std::fs::write(config_path(tmp.path()), "[feed]\nreference_day = 31\n").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_broken_file_falls_back() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(config_path(tmp.path()), "not = [valid").unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.analysis.city_top_n, 10);
    }
}
