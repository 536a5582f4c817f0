//! Doctor command - verify system requirements and configuration.

use crate::cli::preflight::is_ffmpeg;
use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::path::Path;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Print a group of checks under a heading and collect them.
fn section(title: &str, group: Vec<CheckResult>, all: &mut Vec<CheckResult>) {
    println!("{}", style(title).bold());
    for check in &group {
        check.print();
    }
    println!();
    all.extend(group);
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Slowed Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    section(
        "External Tools",
        vec![
            check_tool(&settings.download.ytdlp_bin, install_hint_ytdlp()),
            check_tool(&settings.download.ffmpeg_bin, install_hint_ffmpeg()),
        ],
        &mut checks,
    );

    section(
        "Credentials",
        vec![
            check_secret(
                "YOUTUBE_API_KEY",
                settings.youtube.resolve_api_key(),
                CheckStatus::Error,
                "Set with: export YOUTUBE_API_KEY='...' (needed for run, select, status)",
            ),
            check_secret(
                "DISCORD_WEBHOOK",
                settings.notify.resolve_webhook(),
                CheckStatus::Warning,
                "Optional. Set with: export DISCORD_WEBHOOK='https://discord.com/api/webhooks/...'",
            ),
        ],
        &mut checks,
    );

    section("Directories", check_directories(settings), &mut checks);

    section(
        "Configuration",
        vec![check_config_file(config_path), check_effects(settings)],
        &mut checks,
    );

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Slowed.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Slowed is ready to use.");
    }

    Ok(())
}

/// Check if an external tool is available.
fn check_tool(bin: &str, hint: &str) -> CheckResult {
    let version_arg = if is_ffmpeg(bin) { "-version" } else { "--version" };

    match Command::new(bin).arg(version_arg).output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .chars()
                .take(50)
                .collect::<String>();
            CheckResult::ok(bin, &version)
        }
        Ok(_) => CheckResult::error(bin, "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::error(bin, "not found", hint)
        }
        Err(e) => CheckResult::error(bin, &format!("error: {}", e), hint),
    }
}

/// Check a secret, showing only its tail.
fn check_secret(name: &str, value: Option<String>, missing: CheckStatus, hint: &str) -> CheckResult {
    match value {
        Some(v) => CheckResult::ok(name, &format!("configured ({})", mask(&v))),
        None => CheckResult {
            name: name.to_string(),
            status: missing,
            message: "not set".to_string(),
            hint: Some(hint.to_string()),
        },
    }
}

fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("...{}", tail)
}

/// Check data, temp and output directories and the history database.
fn check_directories(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    for (name, dir) in [
        ("Data directory", settings.data_dir()),
        ("Temp directory", settings.temp_dir()),
        ("Output directory", settings.output_dir()),
    ] {
        if dir.exists() {
            results.push(CheckResult::ok(name, &dir.display().to_string()));
        } else {
            results.push(CheckResult::warning(
                name,
                &format!("{} (will be created)", dir.display()),
                "Directory will be created on first use",
            ));
        }
    }

    let db_path = settings.history_path();
    if db_path.exists() {
        let size = std::fs::metadata(&db_path)
            .map(|m| format_size(m.len()))
            .unwrap_or_else(|_| "unknown size".to_string());
        results.push(CheckResult::ok(
            "History",
            &format!("{} ({})", db_path.display(), size),
        ));
    } else {
        results.push(CheckResult::warning(
            "History",
            &format!("{} (not created yet)", db_path.display()),
            "Database will be created on the first run",
        ));
    }

    results
}

/// Check if config file exists.
fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &config_path.display().to_string())
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: slowed init (or slowed config edit)",
        )
    }
}

/// Check that the effect parameters are usable.
fn check_effects(settings: &Settings) -> CheckResult {
    match settings.effects.validate() {
        Ok(()) => CheckResult::ok(
            "Effects",
            &format!(
                "{}x speed, {:.0}% wet, {} level",
                settings.effects.slow_factor,
                settings.effects.reverb_wet * 100.0,
                settings.effects.loudness_mode
            ),
        ),
        Err(e) => CheckResult::error("Effects", &e.to_string(), "Fix the [effects] section"),
    }
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Platform-specific install hint for yt-dlp.
fn install_hint_ytdlp() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp (or your package manager)"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}

/// Platform-specific install hint for ffmpeg.
fn install_hint_ffmpeg() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install ffmpeg"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install ffmpeg (or your package manager)"
    } else {
        "Install from: https://ffmpeg.org/download.html"
    }
}
