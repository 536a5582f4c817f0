//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;
use std::path::PathBuf;

/// Run the config command against `config_path`.
pub fn run_config(action: &ConfigAction, config_path: PathBuf, settings: Settings) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&redacted(settings))
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Edit => {
            if !config_path.exists() {
                settings.save_to(&config_path)?;
                Output::info(&format!("Created default config at {:?}", config_path));
            }

            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());
            Output::info(&format!("Opening config in {}...", editor));

            match std::process::Command::new(&editor).arg(&config_path).status() {
                Ok(s) if s.success() => match Settings::load_from(Some(&config_path)) {
                    Ok(_) => Output::success("Config saved."),
                    Err(e) => Output::warning(&format!("Config no longer parses: {}", e)),
                },
                Ok(_) => {
                    Output::warning("Editor exited with non-zero status.");
                }
                Err(e) => {
                    Output::error(&format!("Failed to open editor: {}", e));
                    Output::info(&format!("Config file is at: {:?}", config_path));
                }
            }
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

/// Mask secrets before printing.
fn redacted(mut settings: Settings) -> Settings {
    if settings.youtube.api_key.as_deref().is_some_and(|k| !k.is_empty()) {
        settings.youtube.api_key = Some("********".to_string());
    }
    if settings.notify.discord_webhook.as_deref().is_some_and(|w| !w.is_empty()) {
        settings.notify.discord_webhook = Some("********".to_string());
    }
    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacted_masks_secrets() {
        let mut settings = Settings::default();
        settings.youtube.api_key = Some("AIzaSecret".to_string());
        settings.notify.discord_webhook = None;

        let shown = redacted(settings);
        assert_eq!(shown.youtube.api_key.as_deref(), Some("********"));
        assert!(shown.notify.discord_webhook.is_none());
    }

    #[test]
    fn test_path_does_not_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        run_config(&ConfigAction::Path, path.clone(), Settings::default()).unwrap();
        assert!(!path.exists());
    }
}
