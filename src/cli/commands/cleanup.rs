//! Cleanup command implementation.

use crate::cleanup::cleanup_temp_files;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Remove leftover files from the temp directory.
pub fn run_cleanup(settings: &Settings) -> Result<()> {
    let temp_dir = settings.temp_dir();
    let removed = cleanup_temp_files(&temp_dir);

    if removed == 0 {
        Output::info(&format!("Nothing to clean in {}", temp_dir.display()));
    } else {
        Output::success(&format!(
            "Removed {} file(s) from {}",
            removed,
            temp_dir.display()
        ));
    }

    Ok(())
}
