//! History command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::history::{import_legacy_json, HistoryStore};
use crate::orchestrator::open_history;
use anyhow::Result;

/// Show recent runs, or edit the seen set.
pub async fn run_history(
    limit: usize,
    forget: Option<&str>,
    import: Option<&str>,
    settings: Settings,
) -> Result<()> {
    let store = open_history(&settings).await?;
    history_action(store.as_ref(), limit, forget, import).await
}

async fn history_action(
    store: &dyn HistoryStore,
    limit: usize,
    forget: Option<&str>,
    import: Option<&str>,
) -> Result<()> {
    if let Some(video_id) = forget {
        if store.forget(video_id).await? {
            Output::success(&format!("Removed {} from the seen set", video_id));
        } else {
            Output::warning(&format!("{} was not in the seen set", video_id));
        }
        return Ok(());
    }

    if let Some(file) = import {
        let path = Settings::expand_path(file);
        if !path.exists() {
            Output::error(&format!("File not found: {}", path.display()));
            return Err(anyhow::anyhow!("File not found: {}", path.display()));
        }
        let added = import_legacy_json(store, &path).await?;
        Output::success(&format!("Imported {} new video ID(s)", added));
        return Ok(());
    }

    let seen = store.seen_ids().await?;
    let runs = store.list_runs(limit).await?;

    Output::header("Run history");
    Output::kv("Seen tracks", &seen.len().to_string());
    println!();

    if runs.is_empty() {
        Output::info("No runs recorded yet. Start one with: slowed run");
        return Ok(());
    }

    for run in &runs {
        Output::run_record(run);
    }

    Ok(())
}
