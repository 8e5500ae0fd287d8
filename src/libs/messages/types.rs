use crate::libs::timer::Phase;

#[derive(Debug, Clone)]
pub enum Message {
    // === TIMER MESSAGES ===
    TimerControls,
    TimerReady(Phase, String), // phase, remaining
    PhaseStarted(Phase),
    PhaseCompleted(Option<Phase>), // next queued phase
    CountUpLimitReached,
    TimerPaused,
    TimerResumed,
    TimerReset,
    TimerSettingsReloaded,
    TimerSettingsChanged,
    UnknownTimerCommand(String),
    TimerInterrupted,
    TimerInputClosed,

    // === STATS MESSAGES ===
    StatsHeader,
    StatsCleared,
    StatsEmpty,
    StatsFavoriteSlots(String),
    StatsNoFavoriteSlots,
    StatsLoadFailed(String),
    StatsSaveFailed(String),

    // === CONFIGURATION MESSAGES ===
    ConfigSaved,
    ConfigLoadFailed(String),
    ConfigSaveFailed(String),

    // === BACKUP MESSAGES ===
    BackupCreated(String),     // path
    AutoBackupCreated(String), // path
    BackupFailed(String),      // error
    AutoBackupEnabled,
    AutoBackupDisabled,
    BackupsHeader(String), // directory
    NoBackupsFound,

    // === RESTORE MESSAGES ===
    RestoreCompleted,
    RestoreFailed(String),
    RestoreSettingsMerged,
    RestoreSkinExtracted(String, usize), // skin name, file count

    // === SKIN MESSAGES ===
    SkinActivated(String),
    SkinActivationFailed(String),
    SkinFallback(String),

    // === PROMPTS ===
    PromptWorkMinutes,
    PromptShortBreakMinutes,
    PromptLongBreakMinutes,
    PromptSessionsBeforeLongBreak,
    PromptCountUpMode,
    PromptAutoBackup,
}
