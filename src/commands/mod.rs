//! Command-line interface for tomo.
//!
//! Each subcommand lives in its own module with an `Args` struct and a `cmd`
//! entry point; [`Cli::menu`] parses the command line and dispatches.

pub mod backup;
pub mod init;
pub mod restore;
pub mod run;
pub mod skin;
pub mod stats;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Run the focus timer in the terminal")]
    Run(run::RunArgs),
    #[command(about = "Show lifetime focus statistics")]
    Stats(stats::StatsArgs),
    #[command(about = "Create a backup or manage automatic backups")]
    Backup(backup::BackupArgs),
    #[command(about = "Restore statistics, settings and skin from a backup", arg_required_else_help = true)]
    Restore(restore::RestoreArgs),
    #[command(about = "Configuration initialization")]
    Init(init::InitArgs),
    #[command(about = "Switch the active skin", arg_required_else_help = true)]
    Skin(skin::SkinArgs),
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub async fn menu() -> Result<()> {
        let cli = Self::parse();
        match cli.command {
            Commands::Run(args) => run::cmd(args).await,
            Commands::Stats(args) => stats::cmd(args),
            Commands::Backup(args) => backup::cmd(args),
            Commands::Restore(args) => restore::cmd(args),
            Commands::Init(args) => init::cmd(args),
            Commands::Skin(args) => skin::cmd(args),
        }
    }
}
