use super::analytics::{Bucket, Summary};
use super::backup::BackupEntry;
use super::formatter::{format_clock, format_duration, format_share, format_size};
use super::timer::{Phase, Remaining};
use anyhow::Result;
use prettytable::{row, Table};
use std::io::{self, Write};

pub struct View {}

impl View {
    pub fn summary(summary: &Summary) -> Result<()> {
        let mut table = Table::new();
        let total = summary.total_focus_seconds;

        table.add_row(row!["SLOT", "FOCUS", "SHARE"]);
        for bucket in Bucket::ALL {
            let seconds = summary.bucket_seconds.get(bucket);
            table.add_row(row![bucket.as_str(), format_duration(seconds), format_share(seconds, total)]);
        }
        table.add_row(row!["TOTAL", format_duration(total), format!("{} sessions", summary.total_focus_sessions)]);
        table.printstd();

        Ok(())
    }

    pub fn backups(backups: &[BackupEntry]) -> Result<()> {
        let mut table = Table::new();

        table.add_row(row!["NAME", "MODIFIED", "SIZE"]);
        for backup in backups {
            let modified = backup.modified.map(|m| m.format("%Y-%m-%d %H:%M:%S").to_string()).unwrap_or_default();
            table.add_row(row![backup.name, modified, format_size(backup.size)]);
        }
        table.printstd();

        Ok(())
    }

    /// Redraws the single status line of the running timer.
    pub fn clock(phase: Phase, remaining: Remaining, running: bool) -> Result<()> {
        let state = if running { "" } else { " (paused)" };
        let mut stdout = io::stdout();
        write!(stdout, "\r{:<12} {}{:<10}", phase.to_string(), format_clock(remaining.minutes, remaining.seconds), state)?;
        stdout.flush()?;
        Ok(())
    }
}
