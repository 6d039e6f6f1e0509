//! Minimal Telegram Bot API client: long polling, sending, chat actions.

use std::time::Duration;

use anyhow::{Result, bail};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Errors from this client never carry the request URL, which embeds the
/// bot token.
#[derive(Clone)]
pub struct TelegramApi {
    client: Client,
    base_url: String,
}

impl std::fmt::Debug for TelegramApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // base_url embeds the bot token.
        f.debug_struct("TelegramApi").finish_non_exhaustive()
    }
}

impl TelegramApi {
    pub fn new(token: &str, poll_timeout_secs: u64) -> Result<Self> {
        Self::with_base_url(format!("https://api.telegram.org/bot{token}"), poll_timeout_secs)
    }

    /// The HTTP timeout leaves headroom over the long-poll window so an idle
    /// `getUpdates` is not cut off client-side.
    pub fn with_base_url(base_url: impl Into<String>, poll_timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(poll_timeout_secs + 10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub(crate) async fn fetch_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<TelegramUpdate>> {
        let url = format!("{}/getUpdates", self.base_url);
        let response = self
            .client
            .get(url)
            .query(&[
                ("timeout", timeout_secs.to_string()),
                ("offset", offset.to_string()),
            ])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(reqwest::Error::without_url)?;

        let payload: TelegramResponse<Vec<TelegramUpdate>> =
            response.json().await.map_err(reqwest::Error::without_url)?;
        if !payload.ok {
            let description = payload
                .description
                .unwrap_or_else(|| "telegram getUpdates failed".to_string());
            bail!(description);
        }

        Ok(payload.result.unwrap_or_default())
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let url = format!("{}/sendMessage", self.base_url);
        let body = SendMessageRequest {
            chat_id,
            text,
            disable_web_page_preview: true,
        };

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(reqwest::Error::without_url)?;

        let payload: TelegramResponse<serde_json::Value> =
            response.json().await.map_err(reqwest::Error::without_url)?;
        if !payload.ok {
            let description = payload
                .description
                .unwrap_or_else(|| "telegram sendMessage failed".to_string());
            bail!(description);
        }

        Ok(())
    }

    /// Best effort; a failed chat action is never surfaced.
    pub(crate) async fn send_chat_action(&self, chat_id: i64, action: &str) {
        let url = format!("{}/sendChatAction", self.base_url);
        let body = serde_json::json!({ "chat_id": chat_id, "action": action });
        let _ = self.client.post(url).json(&body).send().await;
    }
}

#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TelegramUpdate {
    pub update_id: i64,
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TelegramMessage {
    pub chat: TelegramChat,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TelegramChat {
    pub id: i64,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    disable_web_page_preview: bool,
}
