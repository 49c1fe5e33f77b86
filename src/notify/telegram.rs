use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::Notifier;
use crate::scan::state::{NotificationOutcome, NotifyTarget};

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    ok: bool,
    description: Option<String>,
}

/// Posts messages through the Telegram Bot API `sendMessage` call.
pub struct TelegramNotifier {
    client: Client,
    api_url: String,
    timeout: Duration,
}

impl TelegramNotifier {
    pub fn new(client: Client, api_url: impl Into<String>, timeout: Duration) -> Self {
        Self { client, api_url: api_url.into(), timeout }
    }

    fn endpoint(&self, bot_token: &str) -> String {
        format!("{}/bot{}/sendMessage", self.api_url.trim_end_matches('/'), bot_token)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, target: &NotifyTarget, message: &str) -> NotificationOutcome {
        let form = [
            ("chat_id", target.chat_id.as_str()),
            ("text", message),
            ("parse_mode", "HTML"),
            ("disable_web_page_preview", "true"),
        ];
        let resp = self
            .client
            .post(self.endpoint(&target.bot_token))
            .form(&form)
            .timeout(self.timeout)
            .send()
            .await;

        let resp = match resp {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "telegram request failed");
                return NotificationOutcome::failure(format!("Failed to send notification: {}", e));
            }
        };

        let status = resp.status();
        let parsed = resp.json::<SendMessageResponse>().await;
        match parsed {
            Ok(body) if status.is_success() && body.ok => NotificationOutcome::success("Notification sent successfully"),
            Ok(body) => {
                let reason = body.description.unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
                NotificationOutcome::failure(format!("Failed to send notification: {}", reason))
            }
            Err(_) => NotificationOutcome::failure(format!("Failed to send notification: HTTP {}", status.as_u16())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_embeds_token() {
        let n = TelegramNotifier::new(Client::new(), "https://api.telegram.org/", Duration::from_secs(10));
        assert_eq!(n.endpoint("123:abc"), "https://api.telegram.org/bot123:abc/sendMessage");
    }

    #[tokio::test]
    async fn unreachable_api_is_a_failure_outcome() {
        let n = TelegramNotifier::new(Client::new(), "http://127.0.0.1:9", Duration::from_secs(2));
        let outcome = n.send(&NotifyTarget::new("t", "c"), "hi").await;
        assert!(!outcome.success);
        assert!(outcome.message.starts_with("Failed to send notification"));
    }
}
