//! Backup and restore of tomo's persisted state.
//!
//! A backup is a zip archive with this layout:
//!
//! ```text
//! stats.json                      analytics file (required on restore)
//! config.json                     settings file (optional)
//! skin_backup/<skin>/<files...>   active skin, png/ico/json files only
//! ```
//!
//! ## Restore Pipeline
//!
//! ```text
//! validate archive -> parse stats -> apply stats -> merge settings? -> restore skin? -> done
//! ```
//!
//! Each validation step can stop the pipeline with a [`RestoreError`]. Steps
//! that already completed are never undone: if skin extraction fails halfway,
//! the imported statistics stay imported.

use crate::libs::analytics::{AnalyticsSink, ImportError};
use crate::libs::config::{SettingsHandle, AUTO_BACKUP, DEFAULT_SKIN_ID, SKIN_ID, VISUAL_KEYS};
use crate::libs::data_storage::DataStorage;
use crate::libs::messages::Message;
use crate::libs::skin::Skin;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde_json::{Map, Value};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const STATS_ENTRY: &str = "stats.json";
pub const CONFIG_ENTRY: &str = "config.json";
pub const SKIN_BACKUP_DIR: &str = "skin_backup";
pub const AUTO_BACKUP_FILE_NAME: &str = "auto_backup.zip";

/// Skin file extensions copied into an archive.
pub const SKIN_EXTENSIONS: [&str; 3] = ["png", "ico", "json"];

/// Why a restore stopped.
#[derive(Debug, Error)]
pub enum RestoreError {
    #[error("Backup file does not exist: {}", .0.display())]
    NotFound(PathBuf),
    #[error("No statistics found in the backup file")]
    MissingData,
    #[error("Statistics file in the backup is corrupt: {0}")]
    CorruptData(String),
    #[error("Statistics in the backup have an unexpected format: {0}")]
    FormatMismatch(#[from] ImportError),
    #[error("Failed to read the backup archive: {0}")]
    Archive(#[from] ZipError),
    #[error("Failed to write restored files: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to save settings: {0}")]
    Settings(String),
}

/// What a successful restore changed beyond the statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub settings_merged: bool,
    pub skin: Option<String>,
    pub skin_files: usize,
}

/// A backup archive found in the backup directory.
#[derive(Debug, Clone)]
pub struct BackupEntry {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub modified: Option<DateTime<Local>>,
}

pub struct Backup {
    settings: SettingsHandle,
    storage: DataStorage,
}

impl Backup {
    pub fn new(settings: SettingsHandle, storage: DataStorage) -> Self {
        Backup { settings, storage }
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.storage.backups_dir()
    }

    pub fn is_auto_backup_enabled(&self) -> bool {
        self.settings.lock().get_bool(AUTO_BACKUP, false)
    }

    pub fn set_auto_backup_enabled(&self, enabled: bool) -> Result<()> {
        let mut settings = self.settings.lock();
        settings.set(AUTO_BACKUP, enabled);
        settings.save()
    }

    /// Writes a timestamped archive into the backup directory.
    pub fn manual_backup(&self) -> Result<PathBuf> {
        let file_name = format!("backup_{}.zip", Local::now().format("%Y%m%d_%H%M%S"));
        self.create_archive(&self.backup_dir().join(file_name))
    }

    /// Overwrites `auto_backup.zip` when automatic backups are enabled.
    pub fn auto_backup(&self) -> Result<Option<PathBuf>> {
        if !self.is_auto_backup_enabled() {
            return Ok(None);
        }
        self.create_archive(&self.backup_dir().join(AUTO_BACKUP_FILE_NAME)).map(Some)
    }

    /// Archives in the backup directory, newest first.
    pub fn list_backups(&self) -> Result<Vec<BackupEntry>> {
        let dir = self.backup_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();
        for entry in fs::read_dir(&dir).with_context(|| format!("Failed to read {}", dir.display()))? {
            let entry = entry?;
            let path = entry.path();
            let is_zip = path.extension().and_then(|ext| ext.to_str()).map(|ext| ext.eq_ignore_ascii_case("zip")).unwrap_or(false);
            if !is_zip || !path.is_file() {
                continue;
            }
            let metadata = entry.metadata()?;
            backups.push(BackupEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                size: metadata.len(),
                modified: metadata.modified().ok().map(DateTime::<Local>::from),
                path,
            });
        }
        backups.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| b.name.cmp(&a.name)));
        Ok(backups)
    }

    /// Writes the analytics file, the settings file and the active skin into
    /// a new archive at `destination`.
    ///
    /// Missing source files are skipped. A partially written archive is
    /// removed when any step fails.
    pub fn create_archive(&self, destination: &Path) -> Result<PathBuf> {
        let backup_dir = self.backup_dir();
        fs::create_dir_all(&backup_dir).with_context(|| format!("Failed to create {}", backup_dir.display()))?;
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }

        match self.write_archive(destination) {
            Ok(()) => {
                tracing::debug!(path = %destination.display(), "backup archive written");
                Ok(destination.to_path_buf())
            }
            Err(e) => {
                let _ = fs::remove_file(destination);
                Err(e)
            }
        }
    }

    fn write_archive(&self, destination: &Path) -> Result<()> {
        let file = File::create(destination).with_context(|| format!("Failed to create {}", destination.display()))?;
        let mut writer = ZipWriter::new(file);

        let (config_path, skin_id) = {
            let settings = self.settings.lock();
            (settings.path().to_path_buf(), settings.get_str(SKIN_ID, DEFAULT_SKIN_ID))
        };

        for (source, entry_name) in [(self.storage.stats_path(), STATS_ENTRY), (config_path, CONFIG_ENTRY)] {
            if source.is_file() {
                add_file(&mut writer, &source, entry_name)?;
            }
        }

        let skin_dir = Skin::resolve_dir(&self.storage.skins_dir(), &skin_id);
        if skin_dir.is_dir() {
            let base_name = skin_dir.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_else(|| skin_id.clone());
            for entry in WalkDir::new(&skin_dir).sort_by_file_name() {
                let entry = entry?;
                if !entry.file_type().is_file() || !has_skin_extension(entry.path()) {
                    continue;
                }
                let relative = entry.path().strip_prefix(&skin_dir)?;
                let entry_name = format!("{}/{}/{}", SKIN_BACKUP_DIR, base_name, archive_path(relative));
                add_file(&mut writer, entry.path(), &entry_name)?;
            }
        }

        writer.finish()?;
        Ok(())
    }

    /// Restores statistics, visual settings and skin from the archive at
    /// `source`.
    ///
    /// Statistics go to `sink`; settings and skin files are written through
    /// this backup's settings handle and data directory.
    pub fn restore_archive(&self, source: &Path, sink: &mut dyn AnalyticsSink) -> Result<RestoreReport, RestoreError> {
        if !source.exists() {
            return Err(RestoreError::NotFound(source.to_path_buf()));
        }
        let mut archive = ZipArchive::new(File::open(source)?)?;

        let stats = read_entry(&mut archive, STATS_ENTRY)?.ok_or(RestoreError::MissingData)?;
        let data: Value = serde_json::from_slice(&stats).map_err(|e| RestoreError::CorruptData(e.to_string()))?;
        sink.import_data(&data)?;

        let mut report = RestoreReport {
            settings_merged: self.merge_settings(&mut archive),
            ..RestoreReport::default()
        };

        if let Some((name, count)) = self.restore_skin(&mut archive)? {
            report.skin = Some(name);
            report.skin_files = count;
        }

        Ok(report)
    }

    /// Copies the visual keys from the archived settings into the live store.
    ///
    /// A missing or unreadable `config.json` is not an error; it simply
    /// merges nothing.
    fn merge_settings(&self, archive: &mut ZipArchive<File>) -> bool {
        let archived: Map<String, Value> = match read_entry(archive, CONFIG_ENTRY) {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(map) => map,
                Err(e) => {
                    tracing::debug!("ignoring malformed {}: {}", CONFIG_ENTRY, e);
                    return false;
                }
            },
            _ => return false,
        };

        let mut settings = self.settings.lock();
        let mut updated = false;
        for key in VISUAL_KEYS {
            if let Some(value) = archived.get(key) {
                settings.set(key, value.clone());
                updated = true;
            }
        }
        if updated {
            if let Err(e) = settings.save() {
                tracing::warn!("{}", Message::ConfigSaveFailed(format!("{:#}", e)));
            }
        }
        updated
    }

    /// Extracts `skin_backup/<name>/...` into the managed skins directory and
    /// makes `<name>` the active skin.
    ///
    /// The skin name comes from the first skin entry in the archive; every
    /// skin entry is written beneath that name.
    fn restore_skin(&self, archive: &mut ZipArchive<File>) -> Result<Option<(String, usize)>, RestoreError> {
        let prefix = format!("{}/", SKIN_BACKUP_DIR);
        let mut entries = Vec::new();
        for index in 0..archive.len() {
            let file = archive.by_index(index)?;
            if file.name().starts_with(&prefix) {
                entries.push((index, file.name().to_string(), file.is_dir()));
            }
        }

        let Some((_, first, _)) = entries.first() else {
            return Ok(None);
        };
        let skin_name = first.split('/').nth(1).unwrap_or_default().to_string();
        if !is_plain_name(&skin_name) {
            tracing::warn!(entry = %first, "skipping skin with an unusable name");
            return Ok(None);
        }

        let target_dir = self.storage.skins_dir().join(&skin_name);
        fs::create_dir_all(&target_dir)?;

        let mut written = 0;
        for (index, name, is_dir) in &entries {
            if *is_dir || name.ends_with('/') {
                continue;
            }
            let relative = match name.splitn(3, '/').nth(2).and_then(safe_relative_path) {
                Some(relative) => relative,
                None => {
                    tracing::warn!(entry = %name, "skipping skin entry with an unsafe path");
                    continue;
                }
            };

            let target = target_dir.join(relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut entry = archive.by_index(*index)?;
            let mut output = File::create(&target)?;
            io::copy(&mut entry, &mut output)?;
            written += 1;
        }

        let mut settings = self.settings.lock();
        settings.set(SKIN_ID, skin_name.as_str());
        settings.save().map_err(|e| RestoreError::Settings(format!("{:#}", e)))?;

        Ok(Some((skin_name, written)))
    }
}

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

fn add_file(writer: &mut ZipWriter<File>, source: &Path, entry_name: &str) -> Result<()> {
    let content = fs::read(source).with_context(|| format!("Failed to read {}", source.display()))?;
    writer.start_file(entry_name, entry_options())?;
    writer.write_all(&content)?;
    Ok(())
}

/// Reads a whole archive entry, or `None` when the archive has no such entry.
fn read_entry(archive: &mut ZipArchive<File>, name: &str) -> Result<Option<Vec<u8>>, RestoreError> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut content = Vec::new();
    file.read_to_end(&mut content)?;
    Ok(Some(content))
}

fn has_skin_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SKIN_EXTENSIONS.iter().any(|allowed| ext.eq_ignore_ascii_case(allowed)))
        .unwrap_or(false)
}

/// Joins path components with `/`, the separator zip archives use.
fn archive_path(relative: &Path) -> String {
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!((components.next(), components.next()), (Some(Component::Normal(_)), None))
}

fn safe_relative_path(relative: &str) -> Option<PathBuf> {
    if relative.is_empty() {
        return None;
    }
    let path = Path::new(relative);
    if path.components().all(|component| matches!(component, Component::Normal(_))) {
        Some(path.to_path_buf())
    } else {
        None
    }
}
