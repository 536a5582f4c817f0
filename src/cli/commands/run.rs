//! Run command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Pipeline;
use anyhow::Result;

/// Run the full pipeline once.
pub async fn run_pipeline(settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Run, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'slowed doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let pipeline = Pipeline::new(settings).await?;

    let spinner = Output::spinner("Selecting, downloading and processing...");
    let result = pipeline.run_once().await;
    spinner.finish_and_clear();

    match result {
        Ok(done) => {
            Output::success(&format!(
                "Created slowed + reverb edit of '{}'",
                done.track.title
            ));
            Output::track(&done.track);
            Output::report(&done.report);
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Pipeline failed: {}", e));
            Err(e.into())
        }
    }
}
