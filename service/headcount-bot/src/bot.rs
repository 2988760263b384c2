//! Routes inbound chat messages through the headcount conversation.

use crate::adapter::{ChatAdapter, OutgoingMessage, SendReceipt};
use crate::error::Result;
use crate::format;
use crate::message::{ChatId, InboundMessage};
use crate::registry::CategoryRegistry;
use crate::report::{assemble, ReportRow};
use crate::session::{SessionManager, SessionState, Submission};
use crate::store::ReportLog;
use chrono::Local;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Cancel,
    Id,
    Unknown(String),
    /// Addressed as `/name@Other` to a bot other than this one.
    ForOtherBot(String),
}

impl Command {
    /// Parses `/name`, `/name@BotName` and `/name args`. Plain text is `None`.
    ///
    /// `own_username` is this bot's username without the `@`. When it is not
    /// known every addressed command is taken as ours.
    pub fn parse(text: &str, own_username: Option<&str>) -> Option<Self> {
        let token = text.split_whitespace().next()?;
        let token = token.strip_prefix('/')?;
        let (name, addressee) = match token.split_once('@') {
            Some((name, addressee)) => (name, Some(addressee)),
            None => (token, None),
        };

        if let (Some(addressee), Some(own)) = (addressee, own_username) {
            if !addressee.eq_ignore_ascii_case(own) {
                return Some(Self::ForOtherBot(addressee.to_string()));
            }
        }

        Some(match name {
            "start" => Self::Start,
            "cancel" => Self::Cancel,
            "id" => Self::Id,
            other => Self::Unknown(other.to_string()),
        })
    }
}

/// What the bot did with one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Started,
    Prompted { index: usize },
    Rejected { index: usize },
    Completed { persisted: bool },
    Cancelled { had_session: bool },
    EchoedId,
    Ignored,
}

pub struct HeadcountBot {
    adapter: Arc<dyn ChatAdapter>,
    username: Option<String>,
    sessions: Mutex<SessionManager>,
    log: Mutex<ReportLog>,
}

impl HeadcountBot {
    pub fn new(adapter: Arc<dyn ChatAdapter>, registry: Arc<CategoryRegistry>, log: ReportLog) -> Self {
        Self {
            adapter,
            username: None,
            sessions: Mutex::new(SessionManager::new(registry)),
            log: Mutex::new(log),
        }
    }

    /// Sets the bot's own username so commands meant for other bots are skipped.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        let username = username.into();
        self.username = Some(username.trim_start_matches('@').to_string());
        self
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn adapter(&self) -> &Arc<dyn ChatAdapter> {
        &self.adapter
    }

    pub async fn state(&self, chat_id: ChatId) -> SessionState {
        self.sessions.lock().await.state(chat_id)
    }

    pub async fn handle(&self, message: InboundMessage) -> Result<Dispatch> {
        let chat_id = message.chat_id;
        match Command::parse(&message.text, self.username.as_deref()) {
            Some(Command::Start) => self.start(chat_id).await,
            Some(Command::Cancel) => self.cancel(chat_id).await,
            Some(Command::Id) => {
                self.reply(chat_id, format::chat_id(chat_id)).await?;
                Ok(Dispatch::EchoedId)
            }
            Some(Command::Unknown(name)) => {
                debug!(%chat_id, command = %name, "Ignoring unknown command");
                Ok(Dispatch::Ignored)
            }
            Some(Command::ForOtherBot(addressee)) => {
                debug!(%chat_id, %addressee, "Ignoring command addressed to another bot");
                Ok(Dispatch::Ignored)
            }
            None => self.answer(chat_id, &message.text).await,
        }
    }

    async fn start(&self, chat_id: ChatId) -> Result<Dispatch> {
        let prompt = {
            let mut sessions = self.sessions.lock().await;
            format::prompt(sessions.start(chat_id)?)
        };
        info!(%chat_id, "Headcount conversation started");
        self.reply(chat_id, prompt).await?;
        Ok(Dispatch::Started)
    }

    async fn cancel(&self, chat_id: ChatId) -> Result<Dispatch> {
        let had_session = self.sessions.lock().await.cancel(chat_id);
        if had_session {
            info!(%chat_id, "Headcount conversation cancelled");
        } else {
            debug!(%chat_id, "Cancel without an active conversation");
        }
        self.reply(chat_id, format::cancelled()).await?;
        Ok(Dispatch::Cancelled { had_session })
    }

    async fn answer(&self, chat_id: ChatId, text: &str) -> Result<Dispatch> {
        let (reply, dispatch, row) = {
            let mut sessions = self.sessions.lock().await;
            let SessionState::AwaitingInput(index) = sessions.state(chat_id) else {
                debug!(%chat_id, "Ignoring text outside a conversation");
                return Ok(Dispatch::Ignored);
            };

            match sessions.submit(chat_id, text)? {
                Submission::Next(category) => (
                    format::prompt(&category),
                    Dispatch::Prompted { index: index + 1 },
                    None,
                ),
                Submission::Rejected {
                    rejection,
                    category,
                } => {
                    debug!(%chat_id, category = %category.name, ?rejection, "Answer rejected");
                    (
                        format!(
                            "{}\n{}",
                            format::rejection(rejection, &category),
                            format::prompt(&category)
                        ),
                        Dispatch::Rejected { index },
                        None,
                    )
                }
                Submission::Completed(session) => {
                    let report = assemble(&session, sessions.registry(), Local::now())?;
                    info!(%chat_id, timestamp = %report.row.timestamp, "Headcount conversation completed");
                    (
                        format::completion(&report.summary),
                        Dispatch::Completed { persisted: false },
                        Some(report.row),
                    )
                }
            }
        };

        let Some(row) = row else {
            self.reply(chat_id, reply).await?;
            return Ok(dispatch);
        };

        // The summary goes out first; the row is stored even if delivery fails.
        let sent = self.reply(chat_id, reply).await;
        let persisted = self.persist(&row).await;
        sent?;
        Ok(Dispatch::Completed { persisted })
    }

    async fn persist(&self, row: &ReportRow) -> bool {
        // Held across the blocking write so appends stay serialised.
        let log = self.log.lock().await;
        let writer = log.clone();
        let pending = row.clone();
        let appended = tokio::task::spawn_blocking(move || writer.append(&pending)).await;

        match appended {
            Ok(Ok(())) => {
                info!(path = %log.path().display(), timestamp = %row.timestamp, "Headcount row appended");
                true
            }
            Ok(Err(err)) => {
                error!(error = %err, path = %log.path().display(), "Failed to append headcount row");
                false
            }
            Err(err) => {
                error!(error = %err, path = %log.path().display(), "Headcount append task failed");
                false
            }
        }
    }

    async fn reply(&self, chat_id: ChatId, text: String) -> Result<SendReceipt> {
        self.adapter
            .send_message(OutgoingMessage::new(chat_id, text))
            .await
            .inspect_err(|err| warn!(%chat_id, error = %err, "Failed to deliver reply"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse("/start", None), Some(Command::Start));
        assert_eq!(Command::parse("  /cancel  ", None), Some(Command::Cancel));
        assert_eq!(Command::parse("/id@HeadcountBot", None), Some(Command::Id));
        assert_eq!(Command::parse("/start please", None), Some(Command::Start));
        assert_eq!(
            Command::parse("/help", None),
            Some(Command::Unknown("help".to_string()))
        );
        assert_eq!(Command::parse("3", None), None);
        assert_eq!(Command::parse("", None), None);
        assert_eq!(Command::parse("start", None), None);
    }

    #[test]
    fn addressed_commands_match_own_username_case_insensitively() {
        let own = Some("HeadcountBot");
        assert_eq!(Command::parse("/cancel@headcountbot", own), Some(Command::Cancel));
        assert_eq!(Command::parse("/start@HeadcountBot now", own), Some(Command::Start));
        assert_eq!(Command::parse("/id", own), Some(Command::Id));
        assert_eq!(
            Command::parse("/cancel@SomeOtherBot", own),
            Some(Command::ForOtherBot("SomeOtherBot".to_string()))
        );
    }
}
