//! Process command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Pipeline;
use anyhow::Result;
use std::path::PathBuf;

/// Apply the effects chain to a local file.
pub async fn run_process(
    input: &str,
    title: Option<&str>,
    artist: Option<&str>,
    output: Option<&str>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Process, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'slowed doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let input = Settings::expand_path(input);
    let output: Option<PathBuf> = output.map(Settings::expand_path);

    Output::info(&format!("Processing: {}", input.display()));
    let pipeline = Pipeline::offline(settings)?;

    let spinner = Output::spinner("Applying slowed + reverb...");
    let result = pipeline
        .process_local(&input, title, artist, output.as_deref())
        .await;
    spinner.finish_and_clear();

    match result {
        Ok(report) => {
            Output::success("Done");
            Output::report(&report);
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Failed to process: {}", e));
            Err(e.into())
        }
    }
}
