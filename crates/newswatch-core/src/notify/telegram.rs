use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use reqwest::Client;
use serde::Deserialize;

use super::message::{format_alert, MessageStyle};
use super::Notifier;
use crate::config::TelegramConfig;
use crate::matcher::MatchedArticle;
use crate::{Error, Result};

#[derive(Deserialize)]
struct TelegramResponse {
    ok: bool,
    description: Option<String>,
}

/// Telegram Bot API notifier
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    bot_token: Option<String>,
    chat_id: Option<String>,
    style: MessageStyle,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
            style: MessageStyle::from(config),
        })
    }

    /// Whether both the bot token and the destination chat are configured
    pub fn is_configured(&self) -> bool {
        self.bot_token.is_some() && self.chat_id.is_some()
    }

    /// Send a plain-text message to the configured chat
    pub async fn send_text(&self, text: &str) -> Result<()> {
        let token = self.bot_token.as_deref()
            .ok_or_else(|| Error::Notify("TELEGRAM_BOT_TOKEN not set".to_string()))?;
        let chat_id = self.chat_id.as_deref()
            .ok_or_else(|| Error::Notify("TELEGRAM_CHAT_ID not set".to_string()))?;

        // The URL embeds the bot token; keep it out of error messages
        let url = format!("{}/bot{}/sendMessage", self.api_base, token);
        let response = self
            .client
            .post(&url)
            .form(&[
                ("chat_id", chat_id),
                ("text", text),
                ("disable_web_page_preview", "true"),
            ])
            .send()
            .await
            .map_err(|e| Error::Http(e.without_url()))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let detail = serde_json::from_str::<TelegramResponse>(&body)
                .ok()
                .and_then(|r| r.description)
                .unwrap_or(body);
            return Err(Error::Notify(format!("HTTP {}: {}", status, detail)));
        }

        match serde_json::from_str::<TelegramResponse>(&body) {
            Ok(parsed) if !parsed.ok => Err(Error::Notify(
                parsed.description.unwrap_or_else(|| "Telegram rejected the message".to_string()),
            )),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, matches: &[MatchedArticle], scan_time: DateTime<Local>) -> bool {
        if !self.is_configured() {
            tracing::warn!("Telegram bot token or chat id not set, skipping alert");
            return false;
        }

        let message = format_alert(matches, scan_time, &self.style);

        match self.send_text(&message).await {
            Ok(()) => {
                tracing::info!("Telegram alert sent ({} articles)", matches.len());
                true
            }
            Err(e) => {
                tracing::error!("Telegram alert failed: {}", e);
                false
            }
        }
    }
}
