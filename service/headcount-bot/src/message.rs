use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Telegram chat identifier. Sessions are keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub id: String,
    pub chat_id: ChatId,
    pub sender: Participant,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl InboundMessage {
    /// Text message from a regular user, stamped with the current time.
    pub fn text(chat_id: impl Into<ChatId>, text: impl Into<String>) -> Self {
        let chat_id = chat_id.into();
        Self {
            id: String::new(),
            chat_id,
            sender: Participant {
                id: chat_id.to_string(),
                display_name: None,
                username: None,
                role: ParticipantRole::User,
            },
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub role: ParticipantRole,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    User,
    Bot,
    #[default]
    Unknown,
}
