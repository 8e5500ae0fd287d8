use crate::{
    libs::{backup::Backup, config::Settings, data_storage::DataStorage, messages::Message, view::View},
    msg_error_anyhow, msg_info, msg_print, msg_success,
};
use anyhow::Result;
use clap::{Args, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

#[derive(Debug, Args)]
pub struct BackupArgs {
    /// Turn the automatic backup after each finished phase on or off
    #[arg(long, value_enum)]
    auto: Option<Toggle>,
    /// List existing backups instead of creating one
    #[arg(short, long)]
    list: bool,
}

pub fn cmd(backup_args: BackupArgs) -> Result<()> {
    let storage = DataStorage::new();
    let settings = Settings::open(&storage)?.into_handle();
    let backup = Backup::new(settings, storage);

    if let Some(toggle) = backup_args.auto {
        let enabled = toggle == Toggle::On;
        backup.set_auto_backup_enabled(enabled)?;
        if enabled {
            msg_success!(Message::AutoBackupEnabled);
        } else {
            msg_success!(Message::AutoBackupDisabled);
        }
        return Ok(());
    }

    if backup_args.list {
        let backups = backup.list_backups()?;
        if backups.is_empty() {
            msg_info!(Message::NoBackupsFound);
        } else {
            msg_print!(Message::BackupsHeader(backup.backup_dir().display().to_string()), true);
            View::backups(&backups)?;
        }
        return Ok(());
    }

    match backup.manual_backup() {
        Ok(path) => {
            msg_success!(Message::BackupCreated(path.display().to_string()));
            Ok(())
        }
        Err(e) => Err(msg_error_anyhow!(Message::BackupFailed(format!("{:#}", e)))),
    }
}
