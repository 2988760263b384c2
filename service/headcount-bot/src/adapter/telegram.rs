use super::{AdapterStatus, ChatAdapter, OutgoingMessage, SendReceipt, UpdateBatch};
use crate::config::TelegramConfig;
use crate::error::{HeadcountError, Result};
use crate::message::{ChatId, InboundMessage, Participant, ParticipantRole};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Headroom on top of the long-poll timeout before the HTTP client gives up.
const POLL_GRACE: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct TelegramAdapter {
    id: String,
    client: Client,
    config: TelegramConfig,
}

impl TelegramAdapter {
    pub fn new(config: TelegramConfig) -> Result<Self> {
        if config.bot_token.trim().is_empty() {
            return Err(HeadcountError::InvalidConfig(
                "Telegram bot token cannot be empty".into(),
            ));
        }

        let client = Client::builder().build()?;
        let id = config.label.clone().unwrap_or_else(|| "telegram".to_string());

        Ok(Self { id, client, config })
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.bot_token,
            method
        )
    }
}

/// Keeps text messages from people; drops bot traffic and non-text updates.
fn convert_message(msg: TelegramMessage) -> Option<InboundMessage> {
    let text = msg.text.filter(|t| !t.is_empty())?;
    let chat = msg.chat?;
    let from = msg.from?;
    if from.is_bot.unwrap_or(false) {
        debug!(chat_id = chat.id, "Skipping bot message");
        return None;
    }

    let display_name = from.first_name.as_ref().map(|f| match &from.last_name {
        Some(l) => format!("{f} {l}"),
        None => f.clone(),
    });
    let timestamp = DateTime::<Utc>::from_timestamp(msg.date, 0).unwrap_or_else(Utc::now);

    Some(InboundMessage {
        id: msg.message_id.to_string(),
        chat_id: ChatId(chat.id),
        sender: Participant {
            id: from.id.to_string(),
            display_name,
            username: from.username,
            role: ParticipantRole::User,
        },
        text,
        timestamp,
    })
}

fn convert_updates(updates: Vec<TelegramUpdate>, offset: Option<i64>) -> UpdateBatch {
    let next_offset = updates
        .iter()
        .map(|u| u.update_id + 1)
        .max()
        .or(offset);
    let messages = updates
        .into_iter()
        .filter_map(|u| u.message)
        .filter_map(convert_message)
        .collect();
    UpdateBatch {
        messages,
        next_offset,
    }
}

#[async_trait]
impl ChatAdapter for TelegramAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    async fn health_check(&self) -> Result<AdapterStatus> {
        let response = self.client.get(self.api_url("getMe")).send().await?;

        let status = response.status();
        let payload: TelegramResponse<TelegramUser> = response.json().await?;
        let ok = payload.ok && status.is_success();
        let username = payload.result.and_then(|user| user.username);
        let details = match &username {
            Some(name) => Some(format!("@{name}")),
            None => payload.description,
        };

        Ok(AdapterStatus {
            is_online: ok,
            last_checked_at: Utc::now(),
            details,
            username,
        })
    }

    async fn fetch_updates(&self, offset: Option<i64>, timeout: Duration) -> Result<UpdateBatch> {
        let mut query: Vec<(&str, String)> = vec![
            ("timeout", timeout.as_secs().to_string()),
            ("allowed_updates", r#"["message"]"#.to_string()),
        ];
        if let Some(off) = offset {
            query.push(("offset", off.to_string()));
        }

        let response = self
            .client
            .get(self.api_url("getUpdates"))
            .query(&query)
            .timeout(timeout + POLL_GRACE)
            .send()
            .await?;

        let payload: TelegramResponse<Vec<TelegramUpdate>> = response.json().await?;
        if !payload.ok {
            return Err(HeadcountError::telegram("getUpdates", payload.description));
        }

        Ok(convert_updates(payload.result.unwrap_or_default(), offset))
    }

    async fn send_message(&self, message: OutgoingMessage) -> Result<SendReceipt> {
        let payload = json!({
            "chat_id": message.chat_id.0,
            "text": message.text,
        });

        let response = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&payload)
            .send()
            .await?;

        let resp: TelegramResponse<TelegramMessage> = response.json().await?;
        if !resp.ok {
            return Err(HeadcountError::telegram("sendMessage", resp.description));
        }

        let msg = resp
            .result
            .ok_or_else(|| HeadcountError::other("Telegram response missing result"))?;
        let timestamp = DateTime::<Utc>::from_timestamp(msg.date, 0).unwrap_or_else(Utc::now);

        Ok(SendReceipt {
            message_id: msg.message_id.to_string(),
            timestamp,
            chat_id: message.chat_id,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct TelegramUpdate {
    update_id: i64,
    #[serde(default)]
    message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
struct TelegramMessage {
    message_id: i64,
    date: i64,
    #[serde(default)]
    from: Option<TelegramUser>,
    #[serde(default)]
    chat: Option<TelegramChat>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TelegramUser {
    id: i64,
    #[serde(default)]
    is_bot: Option<bool>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TelegramChat {
    id: i64,
}
