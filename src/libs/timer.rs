//! Focus timer state machine.
//!
//! The timer moves between three phases (work, short break, long break) on a
//! one-second tick delivered by an external scheduler. It never schedules
//! itself: whoever owns it calls [`Timer::on_tick`] once per second and the
//! timer ignores ticks while stopped.
//!
//! ## Modes
//!
//! - **Timed**: each phase counts down from its configured length. At zero the
//!   timer finalizes the session, queues the next phase and stops; the next
//!   phase only begins on an explicit [`Timer::start`].
//! - **Count-up**: the timer counts up from zero and stops itself at 90 minutes.
//!
//! ## Sessions
//!
//! Seconds spent in a work phase are accumulated and handed to the analytics
//! engine when the phase ends, but only if the phase lasted at least two
//! minutes. Shorter sessions are discarded.
//!
//! ## Events
//!
//! State changes are published as [`TimerEvent`]s to every subscriber, in
//! emission order, on the caller's thread.

use crate::libs::analytics::AnalyticsHandle;
use crate::libs::config::{SettingsHandle, TimerConfig};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Upper bound of the count-up mode (90 minutes).
pub const COUNT_UP_LIMIT_SECONDS: u32 = 90 * 60;

/// Shortest work phase that counts as a completed session.
pub const MIN_SESSION_SECONDS: u32 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Work,
    ShortBreak,
    LongBreak,
}

impl Phase {
    pub fn is_work(&self) -> bool {
        matches!(self, Phase::Work)
    }
}

/// Countdown remainder of a timed phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Remaining {
    pub minutes: u32,
    pub seconds: u32,
}

impl Remaining {
    pub fn new(minutes: u32, seconds: u32) -> Self {
        Remaining { minutes, seconds }
    }

    pub fn zero() -> Self {
        Remaining::default()
    }

    pub fn is_zero(&self) -> bool {
        self.minutes == 0 && self.seconds == 0
    }

    /// Removes one second, borrowing a minute when the seconds are zero.
    fn decrement(&mut self) {
        if self.seconds == 0 {
            self.minutes = self.minutes.saturating_sub(1);
            self.seconds = 59;
        } else {
            self.seconds -= 1;
        }
    }
}

/// Notifications published by the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Display value changed: remaining time in timed mode, elapsed time in count-up mode.
    Tick { minutes: u32, seconds: u32 },
    PhaseChanged(Phase),
    /// The current phase ran to its end.
    Completed,
}

impl TimerEvent {
    fn tick(remaining: Remaining) -> Self {
        TimerEvent::Tick {
            minutes: remaining.minutes,
            seconds: remaining.seconds,
        }
    }
}

/// Live timer state. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerState {
    pub phase: Phase,
    /// Phase waiting for the next `start()`; only set while stopped.
    pub pending_phase: Option<Phase>,
    pub remaining: Remaining,
    pub count_up_seconds: u32,
    pub running: bool,
    /// Valid work sessions completed during this process.
    pub sessions_completed: u32,
    /// Seconds accrued in the work phase in progress.
    pub current_session_seconds: u32,
}

pub type Listener = Box<dyn FnMut(&TimerEvent) + Send>;

pub struct Timer {
    settings: SettingsHandle,
    analytics: Option<AnalyticsHandle>,
    state: TimerState,
    listeners: Vec<Listener>,
    clock: fn() -> NaiveDateTime,
}

impl Timer {
    /// Creates a stopped timer at the start of a work phase.
    ///
    /// `analytics` receives finalized sessions; pass `None` to run without
    /// recording statistics.
    pub fn new(settings: SettingsHandle, analytics: Option<AnalyticsHandle>) -> Self {
        let config = settings.lock().timer_config();
        Timer {
            settings,
            analytics,
            state: TimerState {
                phase: Phase::Work,
                pending_phase: None,
                remaining: Remaining::new(config.work_minutes, 0),
                count_up_seconds: 0,
                running: false,
                sessions_completed: 0,
                current_session_seconds: 0,
            },
            listeners: Vec::new(),
            clock: local_now,
        }
    }

    /// Replaces the wall clock used to pick analytics buckets.
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    /// Registers a listener for every subsequent event.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&TimerEvent) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn pending_phase(&self) -> Option<Phase> {
        self.state.pending_phase
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn remaining(&self) -> Remaining {
        self.state.remaining
    }

    pub fn sessions_completed(&self) -> u32 {
        self.state.sessions_completed
    }

    /// Current timer options as read from the settings store.
    pub fn config(&self) -> TimerConfig {
        self.settings.lock().timer_config()
    }

    /// Value shown to the user right now: elapsed time in count-up mode,
    /// remaining time otherwise.
    pub fn display(&self) -> Remaining {
        if self.config().count_up {
            Remaining::new(self.state.count_up_seconds / 60, self.state.count_up_seconds % 60)
        } else {
            self.state.remaining
        }
    }

    /// Starts or resumes the timer, first entering the queued phase if any.
    pub fn start(&mut self) {
        if let Some(next) = self.state.pending_phase.take() {
            let config = self.config();
            self.enter_phase(next, &config);
        }
        self.state.running = true;
    }

    pub fn pause(&mut self) {
        self.state.running = false;
    }

    /// Finalizes the current session and returns to a stopped work phase.
    pub fn reset(&mut self) {
        self.finalize_session();
        let config = self.config();

        self.state.running = false;
        self.state.pending_phase = None;
        self.state.phase = Phase::Work;
        self.state.remaining = if config.count_up {
            Remaining::zero()
        } else {
            Remaining::new(config.work_minutes, 0)
        };
        self.state.count_up_seconds = 0;
        self.state.current_session_seconds = 0;

        self.emit(TimerEvent::PhaseChanged(Phase::Work));
        self.emit(TimerEvent::tick(self.state.remaining));
    }

    /// Moves to the next phase immediately without waiting for zero.
    ///
    /// A queued phase is entered directly; otherwise the next phase is chosen
    /// exactly as at the natural end of a countdown. The running flag is left
    /// as it was.
    pub fn skip(&mut self) {
        let config = self.config();
        let next = match self.state.pending_phase.take() {
            Some(next) => next,
            None => {
                self.finalize_session();
                self.next_phase(&config)
            }
        };
        self.enter_phase(next, &config);
    }

    /// Clears the count-up counter and stops on a fresh work phase.
    pub fn set_count_up_zero(&mut self) {
        self.finalize_session();
        self.state.running = false;
        self.state.pending_phase = None;
        self.state.count_up_seconds = 0;
        self.state.current_session_seconds = 0;
        self.state.phase = Phase::Work;

        self.emit(TimerEvent::tick(Remaining::zero()));
        self.emit(TimerEvent::PhaseChanged(Phase::Work));
    }

    /// Advances the timer by one second. Does nothing while stopped.
    pub fn on_tick(&mut self) {
        if !self.state.running {
            return;
        }

        let config = self.config();
        if self.state.phase.is_work() {
            self.state.current_session_seconds += 1;
        }

        if config.count_up {
            self.tick_count_up();
        } else {
            self.tick_countdown(&config);
        }
    }

    /// Counts one second up and stops at the 90 minute cap.
    ///
    /// The counter is not cleared at the cap, so calling `start` again without
    /// `reset` or `set_count_up_zero` completes once more on the next tick.
    fn tick_count_up(&mut self) {
        self.state.count_up_seconds += 1;
        if self.state.count_up_seconds >= COUNT_UP_LIMIT_SECONDS {
            self.state.count_up_seconds = COUNT_UP_LIMIT_SECONDS;
            self.state.running = false;
            self.finalize_session();
            self.emit(TimerEvent::Completed);
            self.emit(TimerEvent::tick(Remaining::zero()));
            return;
        }

        let elapsed = self.state.count_up_seconds;
        self.emit(TimerEvent::tick(Remaining::new(elapsed / 60, elapsed % 60)));
    }

    fn tick_countdown(&mut self, config: &TimerConfig) {
        if self.state.remaining.is_zero() {
            self.finalize_session();
            self.emit(TimerEvent::Completed);

            let next = self.next_phase(config);
            tracing::debug!(phase = ?self.state.phase, next = ?next, "phase finished");
            self.state.pending_phase = Some(next);
            self.state.running = false;
            self.emit(TimerEvent::tick(Remaining::zero()));
            return;
        }

        self.state.remaining.decrement();
        self.emit(TimerEvent::tick(self.state.remaining));
    }

    fn enter_phase(&mut self, phase: Phase, config: &TimerConfig) {
        self.state.phase = phase;
        self.state.remaining = Remaining::new(config.minutes_for(phase), 0);
        if phase.is_work() {
            self.state.current_session_seconds = 0;
        }

        self.emit(TimerEvent::PhaseChanged(phase));
        self.emit(TimerEvent::tick(self.state.remaining));
    }

    /// Phase that follows the current one.
    ///
    /// Must run after `finalize_session` so the session just finished is
    /// already counted.
    fn next_phase(&self, config: &TimerConfig) -> Phase {
        match self.state.phase {
            Phase::Work => {
                let completed = self.state.sessions_completed;
                if completed > 0 && completed % config.sessions_before_long_break == 0 {
                    Phase::LongBreak
                } else {
                    Phase::ShortBreak
                }
            }
            Phase::ShortBreak | Phase::LongBreak => Phase::Work,
        }
    }

    /// Records the current work session if it lasted long enough.
    ///
    /// Always clears the session counter, whether or not the session counted.
    fn finalize_session(&mut self) {
        let seconds = self.state.current_session_seconds;
        self.state.current_session_seconds = 0;

        if !self.state.phase.is_work() || seconds < MIN_SESSION_SECONDS {
            if seconds > 0 {
                tracing::debug!(seconds, "discarded short session");
            }
            return;
        }

        self.state.sessions_completed += 1;
        tracing::debug!(seconds, completed = self.state.sessions_completed, "session completed");

        if let Some(analytics) = &self.analytics {
            let mut analytics = analytics.lock();
            analytics.accrue_work_seconds(seconds as i64, (self.clock)());
            analytics.increment_session();
            analytics.flush();
        }
    }

    fn emit(&mut self, event: TimerEvent) {
        for listener in self.listeners.iter_mut() {
            listener(&event);
        }
    }
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}
