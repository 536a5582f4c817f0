//! CLI output formatting utilities.

use crate::effects::ProcessReport;
use crate::history::{RunRecord, RunStatus};
use crate::source::Track;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a selected track.
    pub fn track(track: &Track) {
        println!(
            "  {} {} by {} ({}, {}, {})",
            style("*").cyan(),
            style(&track.title).bold(),
            track.artist,
            style(&track.video_id).dim(),
            track.format_duration(),
            track.origin
        );
    }

    /// Print a processing report.
    pub fn report(report: &ProcessReport) {
        Output::kv("Output", &report.output_path.display().to_string());
        Output::kv(
            "Length",
            &format!(
                "{} -> {}",
                format_duration(report.input_seconds),
                format_duration(report.output_seconds)
            ),
        );
        match report.measured_lufs {
            Some(lufs) => Output::kv(
                "Loudness",
                &format!("{:.1} LUFS ({:+.1} dB)", lufs, report.gain_db),
            ),
            None => Output::kv("Gain", &format!("{:+.1} dB", report.gain_db)),
        }
        Output::kv("Peak", &format!("{:.3}", report.peak));
    }

    /// Print one run from the history log.
    pub fn run_record(record: &RunRecord) {
        let status = match record.status {
            RunStatus::Succeeded => style("ok  ").green(),
            RunStatus::Failed => style("fail").red(),
        };
        println!(
            "  {} {} {} ({}, {}s)",
            status,
            style(record.started_at.format("%Y-%m-%d %H:%M")).dim(),
            style(&record.title).bold(),
            style(&record.video_id).dim(),
            record.elapsed_seconds()
        );
        let detail = record.output_path.as_deref().or(record.error.as_deref());
        if let Some(d) = detail {
            println!("       {}", style(content_preview(d, 120)).dim());
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        let spinner_style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(spinner_style);
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Format duration in seconds as M:SS, or H:MM:SS past an hour.
fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds.round() as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Truncate content with ellipsis.
fn content_preview(content: &str, max_len: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_len {
        content
    } else {
        format!("{}...", content.chars().take(max_len).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "0:00");
        assert_eq!(format_duration(213.4), "3:33");
        assert_eq!(format_duration(3723.0), "1:02:03");
    }

    #[test]
    fn test_content_preview() {
        assert_eq!(content_preview("short", 10), "short");
        assert_eq!(content_preview("a\nb", 10), "a b");
        assert_eq!(content_preview("ééééé", 3), "ééé...");
    }
}
