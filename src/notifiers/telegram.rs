//! Telegram Bot API delivery.
//!
//! One `sendMessage` call per message. Credentials come from
//! [`TelegramConfig`]; when they are missing the notifier reports a failed
//! delivery instead of erroring.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::Notifier;
use crate::config::TelegramConfig;
use crate::utils::error::{AppError, Result};

pub const TEST_MESSAGE: &str =
    "🧪 <b>Test message</b>\n\nIf you received this, the playbill watcher can reach this chat.";

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

pub struct TelegramNotifier {
    client: Client,
    config: TelegramConfig,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, bot_token: &str) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.api_base_url.trim_end_matches('/'),
            bot_token
        )
    }

    fn payload(&self, chat_id: &str, text: &str) -> serde_json::Value {
        json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": self.config.parse_mode,
        })
    }

    fn credential<'a>(value: &'a Option<String>, key: &str) -> Result<&'a str> {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::ConfigurationMissing { key: key.to_string() })
    }

    /// Sends `text` and returns the Telegram message id when the API reports one.
    pub async fn send_message(&self, text: &str) -> Result<Option<i64>> {
        let bot_token = Self::credential(&self.config.bot_token, "telegram.bot_token (BOT_TOKEN)")?;
        let chat_id = Self::credential(&self.config.chat_id, "telegram.chat_id (CHAT_ID)")?;

        debug!(chat_id, "sendMessage");

        // Request URLs embed the bot token, so errors are stripped of them.
        let response = self
            .client
            .post(self.endpoint(bot_token))
            .json(&self.payload(chat_id, text))
            .send()
            .await
            .map_err(|e| AppError::DeliveryFailed(format!("request failed: {}", e.without_url())))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let description = serde_json::from_str::<ApiResponse<serde_json::Value>>(&body)
                .ok()
                .and_then(|r| r.description)
                .unwrap_or(body);
            return Err(AppError::DeliveryFailed(format!(
                "Telegram responded {}: {}",
                status, description
            )));
        }

        let message_id = serde_json::from_str::<ApiResponse<SentMessage>>(&body)
            .ok()
            .filter(|r| r.ok)
            .and_then(|r| r.result)
            .map(|m| m.message_id);
        Ok(message_id)
    }

    pub async fn send_test_message(&self) -> bool {
        self.deliver(TEST_MESSAGE).await
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn deliver(&self, text: &str) -> bool {
        match self.send_message(text).await {
            Ok(message_id) => {
                info!(?message_id, "Message sent to Telegram");
                true
            }
            Err(e @ AppError::ConfigurationMissing { .. }) => {
                warn!(error = %e, "Telegram not configured, message dropped");
                false
            }
            Err(e) => {
                error!(error = %e, "Telegram delivery failed");
                false
            }
        }
    }
}
