use crate::error::Result;
use crate::message::{ChatId, InboundMessage};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

pub mod telegram;

#[derive(Debug, Clone)]
pub struct AdapterStatus {
    pub is_online: bool,
    pub last_checked_at: DateTime<Utc>,
    pub details: Option<String>,
    /// The account's own username, without `@`, when the platform reports one.
    pub username: Option<String>,
}

/// Messages returned by one poll, plus the offset that acknowledges them.
#[derive(Debug, Clone, Default)]
pub struct UpdateBatch {
    pub messages: Vec<InboundMessage>,
    pub next_offset: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub chat_id: ChatId,
    pub text: String,
}

impl OutgoingMessage {
    pub fn new(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SendReceipt {
    pub message_id: String,
    pub timestamp: DateTime<Utc>,
    pub chat_id: ChatId,
}

#[async_trait]
pub trait ChatAdapter: Send + Sync {
    fn id(&self) -> &str;

    async fn health_check(&self) -> Result<AdapterStatus>;

    /// Long-polls for new messages. `offset` acknowledges everything before it.
    async fn fetch_updates(&self, offset: Option<i64>, timeout: Duration) -> Result<UpdateBatch>;

    async fn send_message(&self, message: OutgoingMessage) -> Result<SendReceipt>;
}
