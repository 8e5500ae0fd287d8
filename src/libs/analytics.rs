//! Session analytics: lifetime focus totals bucketed by time of day.
//!
//! The engine owns the persisted statistics file (`stats.json`) and is the only
//! code that mutates it. Work seconds arrive in small increments from the timer
//! and are written out in batches; session completions, imports and clears are
//! written immediately.
//!
//! ## Persisted Format
//!
//! ```text
//! {
//!   "total_focus_seconds": 5400,
//!   "total_focus_sessions": 3,
//!   "bucket_seconds": { "midnight": 0, "morning": 3600, "afternoon": 1800, "evening": 0 }
//! }
//! ```
//!
//! ## Failure Handling
//!
//! Write failures never reach the caller. They are logged, the in-memory state
//! stays authoritative, and the unsaved counter is kept so the next flush
//! retries the write.

use crate::libs::messages::Message;
use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Timelike};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Unsaved seconds that trigger a batched write.
pub const FLUSH_THRESHOLD_SECONDS: u64 = 60;

/// Sessions needed before favorite time slots are reported.
pub const FAVORITE_MIN_SESSIONS: u64 = 5;

/// Share of total focus time a bucket must exceed to be a favorite.
pub const FAVORITE_SHARE: f64 = 0.5;

/// Top-level fields an import must carry.
pub const REQUIRED_FIELDS: [&str; 3] = ["total_focus_seconds", "total_focus_sessions", "bucket_seconds"];

/// Time-of-day accrual category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    /// 00:00 - 06:00
    Midnight,
    /// 06:00 - 12:00
    Morning,
    /// 12:00 - 18:00
    Afternoon,
    /// 18:00 - 24:00
    Evening,
}

impl Bucket {
    pub const ALL: [Bucket; 4] = [Bucket::Midnight, Bucket::Morning, Bucket::Afternoon, Bucket::Evening];

    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=5 => Bucket::Midnight,
            6..=11 => Bucket::Morning,
            12..=17 => Bucket::Afternoon,
            _ => Bucket::Evening,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Midnight => "midnight",
            Bucket::Morning => "morning",
            Bucket::Afternoon => "afternoon",
            Bucket::Evening => "evening",
        }
    }
}

/// Seconds accrued in each time-of-day bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketSeconds {
    pub midnight: u64,
    pub morning: u64,
    pub afternoon: u64,
    pub evening: u64,
}

impl BucketSeconds {
    pub fn get(&self, bucket: Bucket) -> u64 {
        match bucket {
            Bucket::Midnight => self.midnight,
            Bucket::Morning => self.morning,
            Bucket::Afternoon => self.afternoon,
            Bucket::Evening => self.evening,
        }
    }

    fn get_mut(&mut self, bucket: Bucket) -> &mut u64 {
        match bucket {
            Bucket::Midnight => &mut self.midnight,
            Bucket::Morning => &mut self.morning,
            Bucket::Afternoon => &mut self.afternoon,
            Bucket::Evening => &mut self.evening,
        }
    }

    /// Total across all buckets, saturating at `u64::MAX`.
    pub fn sum(&self) -> u64 {
        Bucket::ALL.iter().fold(0u64, |acc, b| acc.saturating_add(self.get(*b)))
    }

    /// Total across all buckets, or `None` if it does not fit in a `u64`.
    pub fn checked_sum(&self) -> Option<u64> {
        Bucket::ALL.iter().try_fold(0u64, |acc, b| acc.checked_add(self.get(*b)))
    }
}

/// Persisted analytics counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsState {
    pub total_focus_seconds: u64,
    pub total_focus_sessions: u64,
    pub bucket_seconds: BucketSeconds,
}

/// Result of [`Analytics::summary`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_focus_seconds: u64,
    pub total_focus_sessions: u64,
    pub bucket_seconds: BucketSeconds,
    pub favorite_slots: Vec<Bucket>,
}

/// Reasons an analytics import is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("statistics must be a JSON object")]
    NotAnObject,
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
    #[error("invalid statistics values: {0}")]
    InvalidValues(String),
    #[error("bucket seconds add up to {buckets} but total focus seconds is {total}")]
    InconsistentTotals { buckets: u64, total: u64 },
}

/// Anything that can take a wholesale replacement of the analytics state.
///
/// Backup restore talks to the analytics engine only through this trait.
pub trait AnalyticsSink {
    fn import_data(&mut self, data: &Value) -> Result<(), ImportError>;
}

/// Shared analytics engine, locked once per operation.
pub type AnalyticsHandle = Arc<Mutex<Analytics>>;

#[derive(Debug)]
pub struct Analytics {
    path: PathBuf,
    state: AnalyticsState,
    unsaved_seconds: u64,
}

impl Analytics {
    /// Loads the statistics file at `path`, starting from zero when it is
    /// missing or unreadable.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match read_state(&path) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!("{}", Message::StatsLoadFailed(format!("{:#}", e)));
                AnalyticsState::default()
            }
        };

        Analytics {
            path,
            state,
            unsaved_seconds: 0,
        }
    }

    pub fn into_handle(self) -> AnalyticsHandle {
        Arc::new(Mutex::new(self))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> &AnalyticsState {
        &self.state
    }

    /// Seconds accrued since the last successful write.
    pub fn unsaved_seconds(&self) -> u64 {
        self.unsaved_seconds
    }

    /// Adds `seconds` of work to the totals and to the bucket of `at`.
    ///
    /// Non-positive values are ignored. Once 60 or more seconds are pending
    /// the state is written out.
    pub fn accrue_work_seconds(&mut self, seconds: i64, at: NaiveDateTime) {
        if seconds <= 0 {
            return;
        }
        let seconds = seconds as u64;
        let bucket = Bucket::from_hour(at.hour());

        let slot = self.state.bucket_seconds.get_mut(bucket);
        *slot = slot.saturating_add(seconds);
        self.state.total_focus_seconds = self.state.total_focus_seconds.saturating_add(seconds);
        self.unsaved_seconds = self.unsaved_seconds.saturating_add(seconds);
        tracing::debug!(seconds, bucket = bucket.as_str(), "accrued work seconds");

        if self.unsaved_seconds >= FLUSH_THRESHOLD_SECONDS && self.persist() {
            self.unsaved_seconds = 0;
        }
    }

    /// Counts one completed session and writes immediately.
    pub fn increment_session(&mut self) {
        self.state.total_focus_sessions = self.state.total_focus_sessions.saturating_add(1);
        if self.persist() {
            self.unsaved_seconds = 0;
        }
    }

    /// Writes pending seconds, if any.
    pub fn flush(&mut self) {
        if self.unsaved_seconds > 0 && self.persist() {
            self.unsaved_seconds = 0;
        }
    }

    pub fn summary(&self) -> Summary {
        let total = self.state.total_focus_seconds;
        let sessions = self.state.total_focus_sessions;
        let buckets = self.state.bucket_seconds;

        let mut favorite_slots = Vec::new();
        if total > 0 && sessions > FAVORITE_MIN_SESSIONS {
            for bucket in Bucket::ALL {
                let share = buckets.get(bucket) as f64 / total as f64;
                if share > FAVORITE_SHARE {
                    favorite_slots.push(bucket);
                }
            }
        }

        Summary {
            total_focus_seconds: total,
            total_focus_sessions: sessions,
            bucket_seconds: buckets,
            favorite_slots,
        }
    }

    /// Replaces the whole state with `data` after validating it.
    ///
    /// On any error the current state is left untouched.
    pub fn import_data(&mut self, data: &Value) -> Result<(), ImportError> {
        let object = data.as_object().ok_or(ImportError::NotAnObject)?;
        for field in REQUIRED_FIELDS {
            if !object.contains_key(field) {
                return Err(ImportError::MissingField(field));
            }
        }

        let state: AnalyticsState = serde_json::from_value(data.clone()).map_err(|e| ImportError::InvalidValues(e.to_string()))?;
        let buckets = state
            .bucket_seconds
            .checked_sum()
            .ok_or_else(|| ImportError::InvalidValues("bucket seconds overflow".to_string()))?;
        if buckets != state.total_focus_seconds {
            return Err(ImportError::InconsistentTotals {
                buckets,
                total: state.total_focus_seconds,
            });
        }

        self.state = state;
        self.unsaved_seconds = 0;
        self.persist();
        Ok(())
    }

    /// Resets every counter to zero and writes immediately.
    pub fn clear(&mut self) {
        self.state = AnalyticsState::default();
        self.unsaved_seconds = 0;
        self.persist();
    }

    /// Writes the state to disk, logging instead of failing.
    fn persist(&self) -> bool {
        match write_state(&self.path, &self.state) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("{}", Message::StatsSaveFailed(format!("{:#}", e)));
                false
            }
        }
    }
}

impl AnalyticsSink for Analytics {
    fn import_data(&mut self, data: &Value) -> Result<(), ImportError> {
        Analytics::import_data(self, data)
    }
}

fn read_state(path: &Path) -> Result<AnalyticsState> {
    if !path.exists() {
        return Ok(AnalyticsState::default());
    }
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let state = serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(state)
}

fn write_state(path: &Path, state: &AnalyticsState) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(state)?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
