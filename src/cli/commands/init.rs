//! Init command - interactive first-run setup.

use crate::cli::preflight::check_tool;
use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::io::{self, Write};
use std::path::Path;

/// Run the init command for first-time setup.
pub fn run_init(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Slowed Setup");
    println!();
    println!("Let's make sure everything is in place for your first edit.\n");

    println!("{}", style("Step 1: Checking prerequisites").bold().cyan());
    println!();

    let missing: Vec<&str> = [
        settings.download.ytdlp_bin.as_str(),
        settings.download.ffmpeg_bin.as_str(),
    ]
    .into_iter()
    .filter(|bin| check_tool(bin).is_err())
    .collect();

    if missing.is_empty() {
        Output::success("yt-dlp and ffmpeg are installed!");
    } else {
        Output::warning("Some tools are missing. Please install them:");
        println!();
        for bin in &missing {
            println!("  {} {} - not found", style("✗").red(), style(bin).bold());
            println!("    {} {}", style("→").dim(), style(install_hint(bin)).dim());
        }
        println!();

        if !prompt_continue("Continue anyway?")? {
            println!();
            Output::info("Setup cancelled. Install the missing tools and run 'slowed init' again.");
            return Ok(());
        }
    }

    println!();

    println!("{}", style("Step 2: Checking credentials").bold().cyan());
    println!();

    if settings.youtube.resolve_api_key().is_none() {
        Output::warning("YOUTUBE_API_KEY is not set.");
        println!();
        println!("  Slowed reads the trending chart through the YouTube Data API v3.");
        println!(
            "  Create a key at: {}",
            style("https://console.cloud.google.com/apis/credentials").underlined()
        );
        println!();
        println!("  {}", style("export YOUTUBE_API_KEY='...'").green());
        println!();

        if !prompt_continue("Continue without API key?")? {
            println!();
            Output::info("Setup cancelled. Set your API key and run 'slowed init' again.");
            return Ok(());
        }
    } else {
        Output::success("YouTube API key is configured!");
    }

    if settings.notify.resolve_webhook().is_none() {
        Output::info("No DISCORD_WEBHOOK set; run notifications are disabled.");
    } else {
        Output::success("Discord webhook is configured!");
    }

    println!();

    println!("{}", style("Step 3: Setting up directories").bold().cyan());
    println!();

    for (name, dir) in [
        ("data", settings.data_dir()),
        ("temp", settings.temp_dir()),
        ("output", settings.output_dir()),
    ] {
        if dir.exists() {
            Output::info(&format!("{} directory exists: {}", name, dir.display()));
        } else {
            std::fs::create_dir_all(&dir)?;
            Output::success(&format!("Created {} directory: {}", name, dir.display()));
        }
    }

    println!();

    println!("{}", style("Step 4: Configuration file").bold().cyan());
    println!();

    if config_path.exists() {
        Output::info(&format!("Config file exists: {}", config_path.display()));
    } else if prompt_continue("Create default configuration file?")? {
        settings.save_to(&config_path.to_path_buf())?;
        Output::success(&format!("Created config file: {}", config_path.display()));
        println!();
        println!("  Edit your config with: {}", style("slowed config edit").green());
    } else {
        Output::info("Skipped config file creation. Using defaults.");
    }

    println!();

    println!("{}", style("Setup Complete!").bold().green());
    println!();
    println!("Next steps:");
    println!("  {} Check system status", style("slowed doctor").cyan());
    println!("  {} Preview the next pick", style("slowed select --dry-run").cyan());
    println!("  {} Make your first edit", style("slowed run").cyan());
    println!("  {} Process a local file", style("slowed process <file>").cyan());
    println!();
    println!("For more help: {}", style("slowed --help").cyan());

    Ok(())
}

/// Get platform-specific install hint.
fn install_hint(tool: &str) -> &'static str {
    let name = Path::new(tool)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    match name.as_str() {
        "yt-dlp" => {
            if cfg!(target_os = "macos") {
                "Install with: brew install yt-dlp"
            } else if cfg!(target_os = "linux") {
                "Install with: pip install yt-dlp"
            } else {
                "Install from: https://github.com/yt-dlp/yt-dlp"
            }
        }
        "ffmpeg" => {
            if cfg!(target_os = "macos") {
                "Install with: brew install ffmpeg"
            } else if cfg!(target_os = "linux") {
                "Install with: sudo apt install ffmpeg"
            } else {
                "Install from: https://ffmpeg.org/download.html"
            }
        }
        _ => "Check that the configured binary path is correct",
    }
}

/// Prompt user for yes/no confirmation.
fn prompt_continue(message: &str) -> io::Result<bool> {
    print!("{} {} ", style("?").cyan(), message);
    print!("{} ", style("[y/N]").dim());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let answer = input.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_hint_by_stem() {
        assert!(install_hint("yt-dlp").contains("yt-dlp"));
        assert!(install_hint("/opt/bin/ffmpeg").contains("ffmpeg"));
        assert!(install_hint("custom-tool").contains("binary path"));
    }
}
