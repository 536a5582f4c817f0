//! Select command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::open_history;
use crate::source::{SelectionRules, TrackSelector, YoutubeApi};
use anyhow::Result;
use std::sync::Arc;

/// Pick the next trending track.
///
/// With `dry_run` the pick is shown but not added to the seen set.
pub async fn run_select(dry_run: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Select, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let source = Arc::new(YoutubeApi::from_settings(&settings.youtube)?);
    let history = open_history(&settings).await?;
    let selector = TrackSelector::new(source, history, SelectionRules::from(&settings.youtube));

    let spinner = Output::spinner("Looking for a trending track...");
    let picked = if dry_run {
        selector.peek().await
    } else {
        selector.select().await
    };
    spinner.finish_and_clear();

    match picked? {
        Some(track) => {
            Output::header("Selected track");
            Output::track(&track);
            Output::kv("URL", &track.watch_url());
            if dry_run {
                Output::info("Dry run: the track was not marked as seen.");
            }
        }
        None => {
            Output::warning("No new trending songs found.");
        }
    }

    Ok(())
}
