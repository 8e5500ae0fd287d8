//! Resolution of the on-disk data directory.
//!
//! Everything tomo persists lives under one base directory:
//!
//! ```text
//! <base>/config.json    settings store
//! <base>/stats.json     focus analytics
//! <base>/skins/<id>/    managed skins
//! <base>/backups/       backup archives
//! ```
//!
//! The base directory is `TOMO_DATA_DIR` when set, otherwise the platform's
//! application data directory joined with `tomo/tomo`.

use anyhow::{Context, Result};
use std::env::consts::OS;
use std::env::var;
use std::fs;
use std::path::{Path, PathBuf};

pub const VENDOR_NAME: &str = "tomo";
pub const APP_NAME: &str = "tomo";

/// Environment variable overriding the base data directory.
pub const DATA_DIR_ENV: &str = "TOMO_DATA_DIR";

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const STATS_FILE_NAME: &str = "stats.json";
pub const SKINS_DIR_NAME: &str = "skins";
pub const BACKUPS_DIR_NAME: &str = "backups";

#[derive(Debug, Clone)]
pub struct DataStorage {
    base_path: PathBuf,
}

impl DataStorage {
    pub fn new() -> Self {
        if let Ok(dir) = var(DATA_DIR_ENV) {
            if !dir.is_empty() {
                return Self::with_base(dir);
            }
        }

        let base_path = match OS {
            "windows" => var("LOCALAPPDATA").unwrap_or_else(|_| ".".into()),
            "macos" => var("HOME").unwrap_or_else(|_| ".".into()) + "/Library/Application Support",
            _ => var("HOME").unwrap_or_else(|_| ".".into()) + "/.local/share",
        };
        let base_path = Path::new(&base_path).join(VENDOR_NAME).join(APP_NAME);

        Self { base_path }
    }

    /// Uses `base_path` as the data directory instead of the platform default.
    pub fn with_base(base_path: impl Into<PathBuf>) -> Self {
        Self { base_path: base_path.into() }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Returns the path of `file_name` inside the data directory, creating
    /// the directory if needed.
    pub fn get_path(&self, file_name: &str) -> Result<PathBuf> {
        if !self.base_path.exists() {
            fs::create_dir_all(&self.base_path).with_context(|| format!("Failed to create data directory: {}", self.base_path.display()))?;
        }
        Ok(self.base_path.join(file_name))
    }

    pub fn config_path(&self) -> PathBuf {
        self.base_path.join(CONFIG_FILE_NAME)
    }

    pub fn stats_path(&self) -> PathBuf {
        self.base_path.join(STATS_FILE_NAME)
    }

    pub fn skins_dir(&self) -> PathBuf {
        self.base_path.join(SKINS_DIR_NAME)
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.base_path.join(BACKUPS_DIR_NAME)
    }
}

impl Default for DataStorage {
    fn default() -> Self {
        Self::new()
    }
}
