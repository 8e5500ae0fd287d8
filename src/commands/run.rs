//! Interactive terminal timer.
//!
//! Drives the timer state machine from a one-second tokio interval and reads
//! single-letter commands from stdin. Timer events are forwarded over a channel
//! and rendered after each step, so listeners never print from inside the
//! state machine.
//!
//! The loop ends on `q`, on Ctrl+C, or when stdin closes. Pending analytics
//! seconds are flushed before returning.

use crate::{
    libs::{
        analytics::Analytics,
        backup::Backup,
        config::{Settings, SettingsHandle, COUNT_UP_MODE},
        data_storage::DataStorage,
        formatter::format_clock,
        messages::Message,
        timer::{Timer, TimerEvent},
        view::View,
    },
    msg_debug, msg_error, msg_info, msg_print, msg_warning,
};
use anyhow::Result;
use clap::Args;
use std::io::{self, BufRead};
use std::str::FromStr;
use std::thread;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::time::{self, Duration, Interval, MissedTickBehavior};

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Count up from zero instead of counting down; saved to the settings
    #[arg(long)]
    count_up: bool,
}

/// Keyboard command read from stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Start,
    Pause,
    Reset,
    Skip,
    Zero,
    Reload,
    Quit,
}

impl FromStr for TimerCommand {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_lowercase().as_str() {
            "s" | "start" => Ok(TimerCommand::Start),
            "p" | "pause" => Ok(TimerCommand::Pause),
            "r" | "reset" => Ok(TimerCommand::Reset),
            "n" | "skip" => Ok(TimerCommand::Skip),
            "z" | "zero" => Ok(TimerCommand::Zero),
            "c" | "reload" => Ok(TimerCommand::Reload),
            "q" | "quit" => Ok(TimerCommand::Quit),
            other => Err(other.to_string()),
        }
    }
}

pub async fn cmd(run_args: RunArgs) -> Result<()> {
    let storage = DataStorage::new();
    let mut settings = Settings::open(&storage)?;
    if run_args.count_up {
        settings.set(COUNT_UP_MODE, true);
        settings.save()?;
    }
    let settings = settings.into_handle();
    let analytics = Analytics::load(storage.stats_path()).into_handle();
    let backup = Backup::new(settings.clone(), storage);

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<TimerEvent>();
    let mut timer = Timer::new(settings.clone(), Some(analytics.clone()));
    timer.subscribe(move |event| {
        let _ = event_tx.send(*event);
    });

    let mut commands = spawn_stdin_reader();

    msg_print!(Message::TimerControls);
    let ready = timer.display();
    msg_info!(Message::TimerReady(timer.phase(), format_clock(ready.minutes, ready.seconds)));

    let mut ticker = time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let shutdown = signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => timer.on_tick(),
            line = commands.recv() => match line {
                Some(line) => match line.parse::<TimerCommand>() {
                    Ok(TimerCommand::Quit) => break,
                    Ok(command) => handle_command(&mut timer, &settings, &mut ticker, command),
                    Err(input) if input.is_empty() => {}
                    Err(input) => msg_warning!(Message::UnknownTimerCommand(input)),
                },
                None => {
                    msg_info!(Message::TimerInputClosed, true);
                    break;
                }
            },
            _ = &mut shutdown => {
                msg_info!(Message::TimerInterrupted, true);
                break;
            }
        }

        while let Ok(event) = event_rx.try_recv() {
            handle_event(&timer, &backup, event);
        }
    }

    timer.pause();
    analytics.lock().flush();
    Ok(())
}

/// Forwards stdin lines to the async loop from a blocking thread.
///
/// The channel closes when stdin reaches end of file.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn handle_command(timer: &mut Timer, settings: &SettingsHandle, ticker: &mut Interval, command: TimerCommand) {
    match command {
        TimerCommand::Start => {
            timer.start();
            // full second before the first tick
            ticker.reset();
            msg_info!(Message::TimerResumed);
        }
        TimerCommand::Pause => {
            timer.pause();
            msg_info!(Message::TimerPaused);
        }
        TimerCommand::Reset => {
            timer.reset();
            msg_info!(Message::TimerReset);
        }
        TimerCommand::Skip => timer.skip(),
        TimerCommand::Zero => timer.set_count_up_zero(),
        TimerCommand::Reload => {
            let before = timer.config();
            settings.lock().reload();
            if before.requires_reset(&timer.config()) {
                timer.reset();
                msg_info!(Message::TimerSettingsChanged);
            } else {
                msg_info!(Message::TimerSettingsReloaded);
            }
        }
        TimerCommand::Quit => {}
    }
}

fn handle_event(timer: &Timer, backup: &Backup, event: TimerEvent) {
    match event {
        TimerEvent::Tick { .. } => {
            if let Err(e) = View::clock(timer.phase(), timer.display(), timer.is_running()) {
                msg_debug!(format!("failed to redraw clock: {}", e));
            }
        }
        TimerEvent::PhaseChanged(phase) => {
            println!();
            msg_info!(Message::PhaseStarted(phase));
        }
        TimerEvent::Completed => {
            println!();
            if timer.config().count_up {
                msg_info!(Message::CountUpLimitReached);
            } else {
                msg_info!(Message::PhaseCompleted(timer.pending_phase()));
            }

            match backup.auto_backup() {
                Ok(Some(path)) => msg_info!(Message::AutoBackupCreated(path.display().to_string())),
                Ok(None) => {}
                Err(e) => msg_error!(Message::BackupFailed(format!("{:#}", e))),
            }
        }
    }
}
