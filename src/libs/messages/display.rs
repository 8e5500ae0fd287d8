//! Display implementation for tomo messages.
//!
//! All user-facing text lives here. Domain values such as [`Phase`] stay
//! language-neutral enums; this module is the only place they are turned into
//! words.

use super::types::Message;
use crate::libs::timer::Phase;
use std::fmt::{Display, Formatter, Result};

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let text = match self {
            Phase::Work => "Work",
            Phase::ShortBreak => "Short break",
            Phase::LongBreak => "Long break",
        };
        write!(f, "{}", text)
    }
}

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let text = match self {
            // === TIMER MESSAGES ===
            Message::TimerControls => {
                "Controls: [s] start  [p] pause  [r] reset  [n] skip  [z] zero count-up  [c] reload settings  [q] quit".to_string()
            }
            Message::TimerReady(phase, remaining) => format!("{} phase ready at {}", phase, remaining),
            Message::PhaseStarted(phase) => format!("{} phase", phase),
            Message::PhaseCompleted(Some(next)) => format!("Phase complete. Press [s] to start: {}", next),
            Message::PhaseCompleted(None) => "Phase complete".to_string(),
            Message::CountUpLimitReached => "Count-up limit of 90 minutes reached".to_string(),
            Message::TimerPaused => "Timer paused".to_string(),
            Message::TimerResumed => "Timer running".to_string(),
            Message::TimerReset => "Timer reset to a fresh work phase".to_string(),
            Message::TimerSettingsReloaded => "Settings reloaded".to_string(),
            Message::TimerSettingsChanged => "Timer settings changed, restarting from a fresh work phase".to_string(),
            Message::UnknownTimerCommand(input) => format!("Unknown command '{}'", input),
            Message::TimerInterrupted => "Interrupted, saving statistics".to_string(),
            Message::TimerInputClosed => "Input closed, stopping the timer".to_string(),

            // === STATS MESSAGES ===
            Message::StatsHeader => "Focus statistics".to_string(),
            Message::StatsCleared => "Statistics cleared".to_string(),
            Message::StatsEmpty => "No focus time recorded yet".to_string(),
            Message::StatsFavoriteSlots(slots) => format!("You focus best in the {}", slots),
            Message::StatsNoFavoriteSlots => "Not enough sessions to find a favorite time of day".to_string(),
            Message::StatsLoadFailed(error) => format!("Failed to read statistics, starting from zero: {}", error),
            Message::StatsSaveFailed(error) => format!("Failed to save statistics: {}", error),

            // === CONFIGURATION MESSAGES ===
            Message::ConfigSaved => "Configuration saved successfully".to_string(),
            Message::ConfigLoadFailed(error) => format!("Failed to read configuration, using defaults: {}", error),
            Message::ConfigSaveFailed(error) => format!("Failed to save configuration: {}", error),

            // === BACKUP MESSAGES ===
            Message::BackupCreated(path) => format!("Backup created: {}", path),
            Message::AutoBackupCreated(path) => format!("Automatic backup written to {}", path),
            Message::BackupFailed(error) => format!("Backup failed: {}", error),
            Message::AutoBackupEnabled => "Automatic backup enabled".to_string(),
            Message::AutoBackupDisabled => "Automatic backup disabled".to_string(),
            Message::BackupsHeader(dir) => format!("Backups in {}", dir),
            Message::NoBackupsFound => "No backups found".to_string(),

            // === RESTORE MESSAGES ===
            Message::RestoreCompleted => "Backup imported successfully".to_string(),
            Message::RestoreFailed(reason) => format!("Import failed: {}", reason),
            Message::RestoreSettingsMerged => "Text color and outline settings restored".to_string(),
            Message::RestoreSkinExtracted(name, count) => format!("Skin '{}' restored ({} files)", name, count),

            // === SKIN MESSAGES ===
            Message::SkinActivated(id) => format!("Skin '{}' is now active", id),
            Message::SkinActivationFailed(error) => format!("Failed to activate skin: {}", error),
            Message::SkinFallback(id) => format!("Keeping previous skin '{}'", id),

            // === PROMPTS ===
            Message::PromptWorkMinutes => "Work duration (minutes, 2-99)".to_string(),
            Message::PromptShortBreakMinutes => "Short break duration (minutes, 1-99)".to_string(),
            Message::PromptLongBreakMinutes => "Long break duration (minutes, 1-99)".to_string(),
            Message::PromptSessionsBeforeLongBreak => "Work sessions before a long break".to_string(),
            Message::PromptCountUpMode => "Count up instead of down".to_string(),
            Message::PromptAutoBackup => "Back up automatically after each phase".to_string(),
        };

        write!(f, "{}", text)
    }
}
