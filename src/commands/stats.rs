use crate::{
    libs::{analytics::Analytics, data_storage::DataStorage, formatter::format_duration, messages::Message, view::View},
    msg_info, msg_print, msg_success,
};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Reset all statistics to zero
    #[arg(long)]
    clear: bool,
    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

pub fn cmd(stats_args: StatsArgs) -> Result<()> {
    let storage = DataStorage::new();
    let mut analytics = Analytics::load(storage.stats_path());

    if stats_args.clear {
        analytics.clear();
        msg_success!(Message::StatsCleared);
        return Ok(());
    }

    let summary = analytics.summary();
    if stats_args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if summary.total_focus_sessions == 0 && summary.total_focus_seconds == 0 {
        msg_info!(Message::StatsEmpty);
        return Ok(());
    }

    msg_print!(Message::StatsHeader, true);
    View::summary(&summary)?;

    if summary.favorite_slots.is_empty() {
        msg_info!(Message::StatsNoFavoriteSlots);
    } else {
        let slots: Vec<&str> = summary.favorite_slots.iter().map(|slot| slot.as_str()).collect();
        msg_info!(Message::StatsFavoriteSlots(slots.join(", ")));
    }
    tracing::debug!(total = %format_duration(summary.total_focus_seconds), "summary shown");

    Ok(())
}
