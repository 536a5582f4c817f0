//! Slowed CLI entry point.

use anyhow::Result;
use clap::Parser;
use slowed::cli::{commands, Cli, Commands};
use slowed::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("slowed={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config_path = cli
        .config
        .as_deref()
        .map(Settings::expand_path)
        .unwrap_or_else(Settings::default_config_path);
    let mut settings = Settings::load_from(Some(&config_path))?;

    if let Some(key) = cli.api_key.clone().filter(|k| !k.is_empty()) {
        settings.youtube.api_key = Some(key);
    }
    if let Some(webhook) = cli.webhook.clone().filter(|w| !w.is_empty()) {
        settings.notify.discord_webhook = Some(webhook);
    }

    std::fs::create_dir_all(settings.data_dir())?;
    std::fs::create_dir_all(settings.temp_dir())?;

    match &cli.command {
        Commands::Run => {
            commands::run_pipeline(settings).await?;
        }

        Commands::Select { dry_run } => {
            commands::run_select(*dry_run, settings).await?;
        }

        Commands::Process {
            input,
            title,
            artist,
            output,
        } => {
            commands::run_process(
                input,
                title.as_deref(),
                artist.as_deref(),
                output.as_deref(),
                settings,
            )
            .await?;
        }

        Commands::Status { video_id, wait } => {
            commands::run_status(video_id, *wait, settings).await?;
        }

        Commands::History {
            limit,
            forget,
            import,
        } => {
            commands::run_history(*limit, forget.as_deref(), import.as_deref(), settings).await?;
        }

        Commands::NotifyTest => {
            commands::run_notify_test(settings).await?;
        }

        Commands::Cleanup => {
            commands::run_cleanup(&settings)?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, &config_path)?;
        }

        Commands::Init => {
            commands::run_init(&settings, &config_path)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, config_path.clone(), settings)?;
        }
    }

    Ok(())
}
