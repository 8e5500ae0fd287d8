//! Skin discovery and validation.
//!
//! A skin is a directory of 256x256 PNG frames. Animated skins hold
//! `skin_*.png` frames played in file-name order; static skins hold a single
//! `skin.png`. An optional `skin.json` carries free-form metadata.
//!
//! Skins are addressed by id: a bare id names a directory under the managed
//! skins root, an absolute path names the directory itself.
//!
//! Rendering is out of scope here. This module only answers whether a skin is
//! usable, so that callers switching skins can fall back to the previous one
//! instead of leaving the `skinId` setting pointing at something broken.

use crate::libs::config::{SettingsHandle, DEFAULT_SKIN_ID, SKIN_ID};
use crate::libs::messages::Message;
use serde_json::{Map, Value};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Required frame width and height in pixels.
pub const SKIN_SIZE: u32 = 256;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

#[derive(Debug, Error)]
pub enum SkinError {
    #[error("No valid 256x256 skin found in {}", .0.display())]
    Invalid(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Skin {
    pub id: String,
    pub dir: PathBuf,
    pub frames: Vec<PathBuf>,
    pub animated: bool,
    pub meta: Map<String, Value>,
}

impl Skin {
    /// Directory a skin id refers to.
    pub fn resolve_dir(skins_root: &Path, skin_id: &str) -> PathBuf {
        let candidate = Path::new(skin_id);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            skins_root.join(skin_id)
        }
    }

    /// Loads and validates the skin `skin_id`.
    ///
    /// Animated frames that are not 256x256 are skipped; if none survive the
    /// single-frame `skin.png` is tried instead.
    pub fn load(skins_root: &Path, skin_id: &str) -> Result<Skin, SkinError> {
        let dir = Self::resolve_dir(skins_root, skin_id);

        let mut sequence: Vec<PathBuf> = match fs::read_dir(&dir) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| {
                    path.file_name()
                        .and_then(|name| name.to_str())
                        .map(|name| {
                            let name = name.to_lowercase();
                            name.starts_with("skin_") && name.ends_with(".png")
                        })
                        .unwrap_or(false)
                })
                .collect(),
            Err(_) => Vec::new(),
        };
        sequence.sort();

        let frames: Vec<PathBuf> = sequence.into_iter().filter(|path| is_valid_frame(path)).collect();
        if !frames.is_empty() {
            return Ok(Skin {
                id: skin_id.to_string(),
                meta: load_meta(&dir),
                dir,
                frames,
                animated: true,
            });
        }

        let single = dir.join("skin.png");
        if is_valid_frame(&single) {
            return Ok(Skin {
                id: skin_id.to_string(),
                meta: load_meta(&dir),
                dir,
                frames: vec![single],
                animated: false,
            });
        }

        Err(SkinError::Invalid(dir))
    }
}

/// Makes `skin_id` the active skin, reverting to `fallback_id` if it fails to
/// load.
///
/// On success the settings are saved with the new id. On failure `skinId` is
/// set back to `fallback_id` and saved, and the load error is returned.
pub fn activate_skin(settings: &SettingsHandle, skins_root: &Path, skin_id: &str, fallback_id: &str) -> Result<Skin, SkinError> {
    let result = Skin::load(skins_root, skin_id);
    let active = if result.is_ok() { skin_id } else { fallback_id };

    let mut settings = settings.lock();
    settings.set(SKIN_ID, active);
    if let Err(e) = settings.save() {
        tracing::warn!("{}", Message::ConfigSaveFailed(format!("{:#}", e)));
    }
    if let Err(e) = &result {
        tracing::warn!(skin = skin_id, fallback = fallback_id, "{}", e);
    }
    result
}

/// Switches from the currently active skin to `skin_id`.
pub fn switch_skin(settings: &SettingsHandle, skins_root: &Path, skin_id: &str) -> Result<Skin, SkinError> {
    let previous = settings.lock().get_str(SKIN_ID, DEFAULT_SKIN_ID);
    activate_skin(settings, skins_root, skin_id, &previous)
}

/// Reads the width and height from a PNG header.
pub fn png_dimensions(path: &Path) -> Option<(u32, u32)> {
    let mut header = [0u8; 24];
    File::open(path).ok()?.read_exact(&mut header).ok()?;
    if header[..8] != PNG_SIGNATURE || &header[12..16] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes([header[16], header[17], header[18], header[19]]);
    let height = u32::from_be_bytes([header[20], header[21], header[22], header[23]]);
    Some((width, height))
}

fn is_valid_frame(path: &Path) -> bool {
    png_dimensions(path) == Some((SKIN_SIZE, SKIN_SIZE))
}

fn load_meta(dir: &Path) -> Map<String, Value> {
    let path = dir.join("skin.json");
    fs::read_to_string(&path)
        .ok()
        .and_then(|content| serde_json::from_str(&content).ok())
        .unwrap_or_default()
}
