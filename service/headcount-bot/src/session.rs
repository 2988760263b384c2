//! Per-chat conversation state.
//!
//! A chat is either idle, awaiting the answer for one category, or finished
//! (completed or cancelled). Only chats awaiting input own a [`Session`];
//! finished chats keep just their terminal marker until the next `/start`.

use crate::error::{HeadcountError, Result};
use crate::message::ChatId;
use crate::registry::{Category, CategoryRegistry};
use crate::validate::{validate_and_advance, Advance, Rejection};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    current_index: usize,
    answers: HashMap<String, u32>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn answer(&self, category: &str) -> Option<u32> {
        self.answers.get(category).copied()
    }

    pub fn answered(&self) -> usize {
        self.answers.len()
    }

    pub fn is_complete(&self, registry: &CategoryRegistry) -> bool {
        self.current_index == registry.len()
    }

    pub(crate) fn record(&mut self, category: &str, value: u32) {
        self.answers.insert(category.to_string(), value);
        self.current_index += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No conversation has been started in this chat.
    Idle,
    AwaitingInput(usize),
    Completed,
    Cancelled,
}

/// What happened to one submitted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Accepted; the next category to prompt for.
    Next(Category),
    /// Refused; the category is prompted for again.
    Rejected {
        rejection: Rejection,
        category: Category,
    },
    /// Accepted the final answer. The session has left the manager.
    Completed(Session),
}

/// Owns every chat's session. Callers serialise access.
pub struct SessionManager {
    registry: Arc<CategoryRegistry>,
    active: HashMap<ChatId, Session>,
    finished: HashMap<ChatId, SessionState>,
}

impl SessionManager {
    pub fn new(registry: Arc<CategoryRegistry>) -> Self {
        Self {
            registry,
            active: HashMap::new(),
            finished: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    /// Creates (or resets) the chat's session and returns the first category.
    pub fn start(&mut self, chat_id: ChatId) -> Result<&Category> {
        self.finished.remove(&chat_id);
        self.active.insert(chat_id, Session::new());
        self.current_category(chat_id)
    }

    /// Discards the chat's session. Returns `false` when nothing was active.
    pub fn cancel(&mut self, chat_id: ChatId) -> bool {
        if self.active.remove(&chat_id).is_some() {
            self.finished.insert(chat_id, SessionState::Cancelled);
            true
        } else {
            false
        }
    }

    pub fn is_active(&self, chat_id: ChatId) -> bool {
        self.active.contains_key(&chat_id)
    }

    pub fn current_category(&self, chat_id: ChatId) -> Result<&Category> {
        let session = self
            .active
            .get(&chat_id)
            .ok_or(HeadcountError::NoActiveSession(chat_id))?;
        let index = session.current_index();
        self.registry
            .get(index)
            .ok_or(HeadcountError::SessionExhausted {
                index,
                len: self.registry.len(),
            })
    }

    pub fn state(&self, chat_id: ChatId) -> SessionState {
        if let Some(session) = self.active.get(&chat_id) {
            return SessionState::AwaitingInput(session.current_index());
        }
        self.finished
            .get(&chat_id)
            .copied()
            .unwrap_or(SessionState::Idle)
    }

    /// Validates `raw_text` as the answer for the chat's current category.
    pub fn submit(&mut self, chat_id: ChatId, raw_text: &str) -> Result<Submission> {
        let category = self.current_category(chat_id)?.clone();
        let session = self
            .active
            .get_mut(&chat_id)
            .ok_or(HeadcountError::NoActiveSession(chat_id))?;

        match validate_and_advance(session, &self.registry, raw_text)? {
            Ok(Advance::Next(index)) => {
                let next = self
                    .registry
                    .get(index)
                    .cloned()
                    .ok_or(HeadcountError::SessionExhausted {
                        index,
                        len: self.registry.len(),
                    })?;
                Ok(Submission::Next(next))
            }
            Ok(Advance::Completed) => {
                let session = self
                    .active
                    .remove(&chat_id)
                    .ok_or(HeadcountError::NoActiveSession(chat_id))?;
                self.finished.insert(chat_id, SessionState::Completed);
                Ok(Submission::Completed(session))
            }
            Err(rejection) => Ok(Submission::Rejected {
                rejection,
                category,
            }),
        }
    }
}
