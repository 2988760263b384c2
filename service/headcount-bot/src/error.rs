use crate::message::ChatId;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HeadcountError>;

#[derive(Debug, Error)]
pub enum HeadcountError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Telegram {method} failed: {description}")]
    Telegram {
        method: &'static str,
        description: String,
    },

    #[error("no active session for chat {0}")]
    NoActiveSession(ChatId),

    /// The session index already points past the last category.
    #[error("session index {index} is beyond the {len} registered categories")]
    SessionExhausted { index: usize, len: usize },

    #[error("session answered {answered} of {len} categories; report requires all")]
    SessionIncomplete { answered: usize, len: usize },

    #[error("{0}")]
    Other(String),
}

impl HeadcountError {
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    pub(crate) fn telegram(method: &'static str, description: Option<String>) -> Self {
        Self::Telegram {
            method,
            description: description.unwrap_or_else(|| "unknown error".into()),
        }
    }
}

/// Failures while loading or rewriting the report log.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("report log I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("report log at {path} is not valid CSV: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("report log at {path} has header {found:?}, expected {expected:?}")]
    HeaderMismatch {
        path: PathBuf,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("failed to replace report log at {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: tempfile::PersistError,
    },
}
