//! Restore command.
//!
//! Restores statistics, visual settings and the archived skin. A restored skin
//! that fails validation is not activated; the previously active skin stays.

use crate::{
    libs::{
        analytics::Analytics,
        backup::Backup,
        config::{Settings, DEFAULT_SKIN_ID, SKIN_ID},
        data_storage::DataStorage,
        messages::Message,
        skin::activate_skin,
    },
    msg_bail_anyhow, msg_info, msg_success, msg_warning,
};
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct RestoreArgs {
    /// Backup archive to restore from
    path: PathBuf,
}

pub fn cmd(restore_args: RestoreArgs) -> Result<()> {
    let storage = DataStorage::new();
    let settings = Settings::open(&storage)?.into_handle();
    let previous_skin = settings.lock().get_str(SKIN_ID, DEFAULT_SKIN_ID);
    let mut analytics = Analytics::load(storage.stats_path());
    let backup = Backup::new(settings.clone(), storage.clone());

    let report = match backup.restore_archive(&restore_args.path, &mut analytics) {
        Ok(report) => report,
        Err(e) => msg_bail_anyhow!(Message::RestoreFailed(e.to_string())),
    };

    if report.settings_merged {
        msg_info!(Message::RestoreSettingsMerged);
    }
    if let Some(skin) = &report.skin {
        msg_info!(Message::RestoreSkinExtracted(skin.clone(), report.skin_files));
        match activate_skin(&settings, &storage.skins_dir(), skin, &previous_skin) {
            Ok(_) => msg_success!(Message::SkinActivated(skin.clone())),
            Err(e) => {
                msg_warning!(Message::SkinActivationFailed(e.to_string()));
                msg_warning!(Message::SkinFallback(previous_skin));
            }
        }
    }

    msg_success!(Message::RestoreCompleted);
    Ok(())
}
