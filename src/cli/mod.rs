//! CLI module for Slowed.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Slowed - trending tracks as "slowed + reverb" edits
///
/// Picks a trending song, downloads it and renders a slowed-down, reverb-soaked
/// version with loudness normalization and fades.
#[derive(Parser, Debug)]
#[command(name = "slowed")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// YouTube Data API key (overrides config)
    #[arg(long, env = "YOUTUBE_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Discord webhook URL (overrides config)
    #[arg(long, global = true)]
    pub webhook: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Select, download and process one trending track
    Run,

    /// Pick the next trending track
    Select {
        /// Show the pick without adding it to the seen set
        #[arg(long)]
        dry_run: bool,
    },

    /// Apply the slowed + reverb chain to a local audio/video file
    Process {
        /// Input file (any format ffmpeg can read)
        input: String,

        /// Title for the ID3 tag (defaults to the file name)
        #[arg(long)]
        title: Option<String>,

        /// Artist for the ID3 tag
        #[arg(long)]
        artist: Option<String>,

        /// Output file (.mp3 or .wav); defaults to the output directory
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Check whether a video is blocked or region-restricted
    Status {
        /// Video ID
        video_id: String,

        /// Seconds to wait before checking (defaults to config)
        #[arg(long)]
        wait: Option<u64>,
    },

    /// Show recent runs and manage the seen set
    History {
        /// Number of runs to show
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Remove a video ID from the seen set
        #[arg(long, value_name = "VIDEO_ID")]
        forget: Option<String>,

        /// Import a JSON array of seen video IDs
        #[arg(long, value_name = "FILE")]
        import: Option<String>,
    },

    /// Send a test notification to the configured webhook
    NotifyTest,

    /// Remove leftover files from the temp directory
    Cleanup,

    /// Check system requirements and configuration
    Doctor,

    /// Initialize Slowed and verify system requirements
    Init,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_process() {
        let cli = Cli::try_parse_from([
            "slowed", "-vv", "process", "song.m4a", "--title", "Song", "-o", "out.mp3",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Process { input, title, output, artist } => {
                assert_eq!(input, "song.m4a");
                assert_eq!(title.as_deref(), Some("Song"));
                assert_eq!(output.as_deref(), Some("out.mp3"));
                assert!(artist.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_history_and_select() {
        let cli = Cli::try_parse_from(["slowed", "history", "--forget", "abc"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::History { limit: 20, forget: Some(_), import: None }
        ));

        let cli = Cli::try_parse_from(["slowed", "select", "--dry-run"]).unwrap();
        assert!(matches!(cli.command, Commands::Select { dry_run: true }));

        let cli = Cli::try_parse_from(["slowed", "notify-test"]).unwrap();
        assert!(matches!(cli.command, Commands::NotifyTest));
    }

    #[test]
    fn test_webhook_flag_does_not_read_environment() {
        std::env::set_var("DISCORD_WEBHOOK", "https://discord.test/env");
        let cli = Cli::try_parse_from(["slowed", "doctor"]).unwrap();
        assert!(cli.webhook.is_none());

        let cli =
            Cli::try_parse_from(["slowed", "--webhook", "https://discord.test/flag", "doctor"])
                .unwrap();
        assert_eq!(cli.webhook.as_deref(), Some("https://discord.test/flag"));
    }
}
