use crate::{
    libs::{
        config::{Settings, DEFAULT_SKIN_ID, SKIN_ID},
        data_storage::DataStorage,
        messages::Message,
        skin::switch_skin,
    },
    msg_success, msg_warning,
};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct SkinArgs {
    /// Skin directory name under the skins folder, or an absolute path
    id: String,
}

pub fn cmd(skin_args: SkinArgs) -> Result<()> {
    let storage = DataStorage::new();
    let settings = Settings::open(&storage)?.into_handle();

    match switch_skin(&settings, &storage.skins_dir(), &skin_args.id) {
        Ok(skin) => msg_success!(Message::SkinActivated(skin.id)),
        Err(e) => {
            msg_warning!(Message::SkinActivationFailed(e.to_string()));
            let current = settings.lock().get_str(SKIN_ID, DEFAULT_SKIN_ID);
            msg_warning!(Message::SkinFallback(current));
        }
    }
    Ok(())
}
