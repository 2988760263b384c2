use crate::error::{HeadcountError, Result};
use crate::message::ChatId;
use crate::registry::Category;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level bot configuration, typically loaded from TOML.
///
/// Every field has a default, so an empty file (or no file at all) yields the
/// original site setup: nineteen categories, reminders at 09:00 and 14:30, and
/// a log file in the working directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadcountConfig {
    #[serde(default = "HeadcountConfig::default_storage_path")]
    pub storage_path: PathBuf,

    /// Header of the first CSV column.
    #[serde(default = "HeadcountConfig::default_date_column")]
    pub date_column: String,

    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub reminder: ReminderConfig,

    #[serde(default = "Category::defaults")]
    pub categories: Vec<Category>,
}

impl HeadcountConfig {
    fn default_storage_path() -> PathBuf {
        PathBuf::from("daily_headcount.csv")
    }

    fn default_date_column() -> String {
        "Дата".to_string()
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|err| HeadcountError::InvalidConfig(err.to_string()))
    }
}

impl Default for HeadcountConfig {
    fn default() -> Self {
        Self {
            storage_path: Self::default_storage_path(),
            date_column: Self::default_date_column(),
            telegram: TelegramConfig::default(),
            reminder: ReminderConfig::default(),
            categories: Category::defaults(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Supplied through `BOT_TOKEN`; never written back out.
    #[serde(default, skip_serializing)]
    pub bot_token: String,
    #[serde(default = "TelegramConfig::default_api_base")]
    pub api_base_url: String,
    /// Seconds the Bot API holds a `getUpdates` call open.
    #[serde(default = "TelegramConfig::default_poll_timeout")]
    pub poll_timeout_secs: u64,
    #[serde(default)]
    pub label: Option<String>,
}

impl TelegramConfig {
    fn default_api_base() -> String {
        "https://api.telegram.org".to_string()
    }

    fn default_poll_timeout() -> u64 {
        30
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_base_url: Self::default_api_base(),
            poll_timeout_secs: Self::default_poll_timeout(),
            label: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    /// Recipient of the daily reminders. Reminders are disabled when unset.
    #[serde(default)]
    pub chat_id: Option<ChatId>,
    /// Local wall-clock times in `HH:MM`.
    #[serde(default = "ReminderConfig::default_times")]
    pub times: Vec<String>,
    #[serde(default = "ReminderConfig::default_text")]
    pub text: String,
}

impl ReminderConfig {
    fn default_times() -> Vec<String> {
        vec!["09:00".to_string(), "14:30".to_string()]
    }

    fn default_text() -> String {
        "⏰ Пожалуйста, введите количество рабочих на площадке. Напишите /start".to_string()
    }
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            chat_id: None,
            times: Self::default_times(),
            text: Self::default_text(),
        }
    }
}
