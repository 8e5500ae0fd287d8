//! Settings store for the tomo application.
//!
//! Settings live in a flat JSON object (`config.json` in the data directory)
//! mapping option names to values. Options owned by outer layers (rendering,
//! audio, language) pass through untouched; the core reads what it needs
//! through typed getters that fall back to fixed defaults.
//!
//! ## Loading
//!
//! [`Settings::load`] never fails:
//! - **Missing file**: every option takes its default
//! - **Corrupted file**: a warning is logged and defaults are used
//! - **Missing keys**: filled from [`Settings::defaults`]
//! - **Out-of-range durations**: clamped (`workMinutes` to 2-99, break
//!   durations to 1-99, `frameDuration` to 100-1000)
//!
//! ## Key Ownership
//!
//! Components receive a [`SettingsHandle`] and touch a fixed subset of keys:
//! - **Timer**: reads `workMinutes`, `shortBreakMinutes`, `longBreakMinutes`,
//!   `sessionsBeforeLongBreak`, `countUpMode`; writes nothing
//! - **Backup**: reads `skinId`, `autoBackup`; writes the text color and
//!   outline keys, `skinId` and `autoBackup`

use crate::libs::data_storage::DataStorage;
use crate::libs::messages::Message;
use crate::libs::timer::Phase;
use anyhow::{Context, Result};
use dialoguer::{theme::ColorfulTheme, Confirm, Input};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const WORK_MINUTES: &str = "workMinutes";
pub const SHORT_BREAK_MINUTES: &str = "shortBreakMinutes";
pub const LONG_BREAK_MINUTES: &str = "longBreakMinutes";
pub const SESSIONS_BEFORE_LONG_BREAK: &str = "sessionsBeforeLongBreak";
pub const COUNT_UP_MODE: &str = "countUpMode";
pub const SKIN_ID: &str = "skinId";
pub const AUTO_BACKUP: &str = "autoBackup";
pub const FRAME_DURATION: &str = "frameDuration";
pub const TEXT_COLOR: &str = "textColor";
pub const TEXT_OUTLINE_ENABLED: &str = "textOutlineEnabled";
pub const TEXT_OUTLINE_COLOR: &str = "textOutlineColor";
pub const TEXT_OUTLINE_WIDTH: &str = "textOutlineWidth";

/// Visual keys carried across a backup restore.
pub const VISUAL_KEYS: [&str; 4] = [TEXT_COLOR, TEXT_OUTLINE_ENABLED, TEXT_OUTLINE_COLOR, TEXT_OUTLINE_WIDTH];

pub const DEFAULT_WORK_MINUTES: u32 = 25;
pub const DEFAULT_SHORT_BREAK_MINUTES: u32 = 5;
pub const DEFAULT_LONG_BREAK_MINUTES: u32 = 15;
pub const DEFAULT_SESSIONS_BEFORE_LONG_BREAK: u32 = 4;
pub const DEFAULT_SKIN_ID: &str = "default";

/// Width written on every visual settings save.
pub const SAVED_OUTLINE_WIDTH: i64 = 1;

/// Shared, lockable settings store passed into each component.
pub type SettingsHandle = Arc<Mutex<Settings>>;

/// Timer-relevant settings resolved to typed values.
///
/// Two snapshots compare equal when a running timer would behave the same
/// under either, which is how settings reloads decide whether to reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    pub work_minutes: u32,
    pub short_break_minutes: u32,
    pub long_break_minutes: u32,
    pub sessions_before_long_break: u32,
    pub count_up: bool,
}

impl TimerConfig {
    /// Configured length of `phase` in minutes.
    pub fn minutes_for(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Work => self.work_minutes,
            Phase::ShortBreak => self.short_break_minutes,
            Phase::LongBreak => self.long_break_minutes,
        }
    }

    /// Whether switching from `self` to `other` should restart the timer.
    ///
    /// Only the work length, the short break length and the counting mode
    /// force a restart; the long break settings apply from the next cycle.
    pub fn requires_reset(&self, other: &TimerConfig) -> bool {
        self.work_minutes != other.work_minutes || self.short_break_minutes != other.short_break_minutes || self.count_up != other.count_up
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        TimerConfig {
            work_minutes: DEFAULT_WORK_MINUTES,
            short_break_minutes: DEFAULT_SHORT_BREAK_MINUTES,
            long_break_minutes: DEFAULT_LONG_BREAK_MINUTES,
            sessions_before_long_break: DEFAULT_SESSIONS_BEFORE_LONG_BREAK,
            count_up: false,
        }
    }
}

/// Key-value settings store backed by a JSON file.
#[derive(Debug, Clone)]
pub struct Settings {
    path: PathBuf,
    values: Map<String, Value>,
}

impl Settings {
    /// Default value for every known option.
    pub fn defaults() -> Map<String, Value> {
        let defaults = json!({
            "workMinutes": DEFAULT_WORK_MINUTES,
            "shortBreakMinutes": DEFAULT_SHORT_BREAK_MINUTES,
            "longBreakMinutes": DEFAULT_LONG_BREAK_MINUTES,
            "sessionsBeforeLongBreak": DEFAULT_SESSIONS_BEFORE_LONG_BREAK,
            "skinId": DEFAULT_SKIN_ID,
            "frameRate": 8,
            "frameDuration": 100,
            "uiScale": 1,
            "alwaysOnTop": true,
            "soundEnabled": false,
            "manualBreak": false,
            "countUpMode": false,
            "autoBackup": false,
            "customSoundPath": "",
            "textColor": "#FFFFFF",
            "textOutlineEnabled": false,
            "textOutlineColor": "#000000",
            "textOutlineWidth": 2,
            "language": "zh-CN"
        });
        match defaults {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    /// Loads settings from `path`, applying defaults and clamping.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut values = match Self::read_values(&path) {
            Ok(values) => values,
            Err(e) => {
                tracing::warn!("{}", Message::ConfigLoadFailed(format!("{:#}", e)));
                Map::new()
            }
        };

        for (key, value) in Self::defaults() {
            values.entry(key).or_insert(value);
        }
        clamp_integer(&mut values, WORK_MINUTES, DEFAULT_WORK_MINUTES as i64, 2, 99);
        clamp_integer(&mut values, SHORT_BREAK_MINUTES, DEFAULT_SHORT_BREAK_MINUTES as i64, 1, 99);
        clamp_integer(&mut values, LONG_BREAK_MINUTES, DEFAULT_LONG_BREAK_MINUTES as i64, 1, 99);
        clamp_integer(&mut values, FRAME_DURATION, 100, 100, 1000);

        Settings { path, values }
    }

    /// Loads the settings file of `storage`, writing a defaults file first
    /// when none exists yet.
    pub fn open(storage: &DataStorage) -> Result<Self> {
        let path = storage.get_path(crate::libs::data_storage::CONFIG_FILE_NAME)?;
        Self::ensure_defaults(&path)?;
        Ok(Self::load(path))
    }

    /// Writes the default settings to `path` if the file does not exist.
    pub fn ensure_defaults(path: &Path) -> Result<()> {
        if path.exists() {
            return Ok(());
        }
        let content = serde_json::to_string_pretty(&Value::Object(Self::defaults()))?;
        fs::write(path, content).with_context(|| format!("Failed to write default settings: {}", path.display()))
    }

    fn read_values(path: &Path) -> Result<Map<String, Value>> {
        if !path.exists() {
            return Ok(Map::new());
        }
        let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let values: Map<String, Value> = serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(values)
    }

    /// Re-reads the settings file, discarding unsaved in-memory changes.
    pub fn reload(&mut self) {
        *self = Self::load(self.path.clone());
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_handle(self) -> SettingsHandle {
        Arc::new(Mutex::new(self))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Reads an integer option. Integral floats and numeric strings are
    /// accepted; anything else yields `default`.
    pub fn get_i64(&self, key: &str, default: i64) -> i64 {
        self.values.get(key).and_then(as_integer).unwrap_or(default)
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.values.get(key) {
            Some(Value::Bool(b)) => *b,
            _ => default,
        }
    }

    pub fn get_str(&self, key: &str, default: &str) -> String {
        match self.values.get(key) {
            Some(Value::String(s)) => s.clone(),
            _ => default.to_string(),
        }
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Persists every option as pretty-printed JSON.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, content).with_context(|| format!("Failed to write settings: {}", self.path.display()))
    }

    /// Resolves the timer options, substituting defaults for missing or
    /// out-of-range values.
    pub fn timer_config(&self) -> TimerConfig {
        let minutes = |key: &str, default: u32| -> u32 {
            match self.get_i64(key, default as i64) {
                value @ 1..=99 => value as u32,
                _ => default,
            }
        };
        let sessions = match self.get_i64(SESSIONS_BEFORE_LONG_BREAK, DEFAULT_SESSIONS_BEFORE_LONG_BREAK as i64) {
            value if value >= 1 && value <= u32::MAX as i64 => value as u32,
            _ => DEFAULT_SESSIONS_BEFORE_LONG_BREAK,
        };

        TimerConfig {
            work_minutes: minutes(WORK_MINUTES, DEFAULT_WORK_MINUTES),
            short_break_minutes: minutes(SHORT_BREAK_MINUTES, DEFAULT_SHORT_BREAK_MINUTES),
            long_break_minutes: minutes(LONG_BREAK_MINUTES, DEFAULT_LONG_BREAK_MINUTES),
            sessions_before_long_break: sessions,
            count_up: self.get_bool(COUNT_UP_MODE, false),
        }
    }

    /// Stores the text appearance options and persists them.
    ///
    /// The outline width is always written as 1, whatever the stored value
    /// was before.
    pub fn save_visual(&mut self, text_color: &str, outline_enabled: bool, outline_color: &str) -> Result<()> {
        self.set(TEXT_COLOR, text_color);
        self.set(TEXT_OUTLINE_ENABLED, outline_enabled);
        self.set(TEXT_OUTLINE_COLOR, outline_color);
        self.set(TEXT_OUTLINE_WIDTH, SAVED_OUTLINE_WIDTH);
        self.save()
    }

    /// Runs an interactive setup wizard for the timer options.
    ///
    /// Existing values are offered as defaults; the entered values are clamped
    /// to the same ranges applied on load. The caller decides whether to save.
    pub fn init(&mut self) -> Result<()> {
        let current = self.timer_config();
        let theme = ColorfulTheme::default();

        let work: u32 = Input::with_theme(&theme)
            .with_prompt(Message::PromptWorkMinutes.to_string())
            .default(current.work_minutes)
            .interact_text()?;
        let short_break: u32 = Input::with_theme(&theme)
            .with_prompt(Message::PromptShortBreakMinutes.to_string())
            .default(current.short_break_minutes)
            .interact_text()?;
        let long_break: u32 = Input::with_theme(&theme)
            .with_prompt(Message::PromptLongBreakMinutes.to_string())
            .default(current.long_break_minutes)
            .interact_text()?;
        let sessions: u32 = Input::with_theme(&theme)
            .with_prompt(Message::PromptSessionsBeforeLongBreak.to_string())
            .default(current.sessions_before_long_break)
            .interact_text()?;
        let count_up = Confirm::with_theme(&theme)
            .with_prompt(Message::PromptCountUpMode.to_string())
            .default(current.count_up)
            .interact()?;
        let auto_backup = Confirm::with_theme(&theme)
            .with_prompt(Message::PromptAutoBackup.to_string())
            .default(self.get_bool(AUTO_BACKUP, false))
            .interact()?;

        self.set(WORK_MINUTES, work.clamp(2, 99));
        self.set(SHORT_BREAK_MINUTES, short_break.clamp(1, 99));
        self.set(LONG_BREAK_MINUTES, long_break.clamp(1, 99));
        self.set(SESSIONS_BEFORE_LONG_BREAK, sessions.max(1));
        self.set(COUNT_UP_MODE, count_up);
        self.set(AUTO_BACKUP, auto_backup);
        Ok(())
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn clamp_integer(values: &mut Map<String, Value>, key: &str, default: i64, min: i64, max: i64) {
    let value = values.get(key).and_then(as_integer).unwrap_or(default);
    values.insert(key.to_string(), Value::from(value.clamp(min, max)));
}
