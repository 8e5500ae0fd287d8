//! Settings initialization command.
//!
//! Walks the user through the timer options with an interactive wizard, or
//! resets every option to its default with `--reset`.

use crate::{
    libs::{config::Settings, data_storage::DataStorage, messages::Message},
    msg_success,
};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Overwrite the settings file with the defaults instead of prompting
    #[arg(short, long)]
    reset: bool,
}

pub fn cmd(init_args: InitArgs) -> Result<()> {
    let storage = DataStorage::new();
    let mut settings = Settings::open(&storage)?;

    if init_args.reset {
        for (key, value) in Settings::defaults() {
            settings.set(&key, value);
        }
    } else {
        settings.init()?;
    }

    settings.save()?;
    msg_success!(Message::ConfigSaved);
    Ok(())
}
