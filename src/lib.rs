//! # Tomo - a terminal focus timer
//!
//! A Pomodoro-style timer with lifetime focus statistics and zip backups.
//!
//! ## Features
//!
//! - **Timer**: work, short break and long break phases, or a 90-minute count-up
//! - **Analytics**: focus time bucketed by time of day, with favorite slots
//! - **Backup/Restore**: statistics, visual settings and the active skin in one archive
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tomo::commands::Cli;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Cli::menu().await
//! }
//! ```

pub mod commands;
pub mod libs;
