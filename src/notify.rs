//! Discord webhook notifications.
//!
//! Delivery is best-effort: failures are logged and never reach the caller.

use crate::config::NotifySettings;
use chrono::Utc;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Embed color for neutral information.
pub const COLOR_INFO: u32 = 5_814_783;
/// Embed color for a finished run.
pub const COLOR_SUCCESS: u32 = 5_763_719;
pub const COLOR_WARNING: u32 = 16_776_960;
pub const COLOR_ERROR: u32 = 15_158_332;

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    embeds: [Embed<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Embed<'a> {
    title: &'a str,
    description: &'a str,
    color: u32,
    timestamp: String,
}

/// Sends embeds to a Discord webhook.
pub struct DiscordNotifier {
    http: reqwest::Client,
    webhook: Option<String>,
}

impl DiscordNotifier {
    /// Build a notifier. Without a webhook every send is a no-op.
    pub fn from_settings(settings: &NotifySettings) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .unwrap_or_default();

        Self {
            http,
            webhook: settings.resolve_webhook(),
        }
    }

    /// True when a webhook is configured.
    pub fn is_enabled(&self) -> bool {
        self.webhook.is_some()
    }

    /// Post one embed. Returns whether the webhook accepted it.
    pub async fn send(&self, title: &str, description: &str, color: u32) -> bool {
        let Some(webhook) = &self.webhook else {
            debug!("No webhook configured, skipping notification");
            return false;
        };

        let payload = WebhookPayload {
            embeds: [Embed {
                title,
                description,
                color,
                timestamp: Utc::now().to_rfc3339(),
            }],
        };

        match self.http.post(webhook).json(&payload).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!("Discord webhook returned {}", response.status());
                false
            }
            Err(e) => {
                warn!("Discord notification failed: {}", e);
                false
            }
        }
    }

    pub async fn info(&self, title: &str, description: &str) -> bool {
        self.send(title, description, COLOR_INFO).await
    }

    pub async fn success(&self, title: &str, description: &str) -> bool {
        self.send(title, description, COLOR_SUCCESS).await
    }

    pub async fn warning(&self, title: &str, description: &str) -> bool {
        self.send(title, description, COLOR_WARNING).await
    }

    pub async fn error(&self, title: &str, description: &str) -> bool {
        self.send(title, description, COLOR_ERROR).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn notifier(webhook: Option<String>) -> DiscordNotifier {
        DiscordNotifier {
            http: reqwest::Client::new(),
            webhook,
        }
    }

    #[tokio::test]
    async fn test_send_posts_embed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_partial_json(serde_json::json!({
                "embeds": [{"title": "Done", "description": "Track ready", "color": COLOR_SUCCESS}]
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let n = notifier(Some(format!("{}/hook", server.uri())));
        assert!(n.success("Done", "Track ready").await);
    }

    #[tokio::test]
    async fn test_failure_is_swallowed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let n = notifier(Some(format!("{}/hook", server.uri())));
        assert!(!n.error("Failed", "boom").await);
    }

    #[tokio::test]
    async fn test_unreachable_webhook_is_swallowed() {
        let n = notifier(Some("http://127.0.0.1:1/hook".to_string()));
        assert!(!n.info("Hello", "world").await);
    }

    #[tokio::test]
    async fn test_disabled_without_webhook() {
        let n = notifier(None);
        assert!(!n.is_enabled());
        assert!(!n.warning("x", "y").await);
    }
}
