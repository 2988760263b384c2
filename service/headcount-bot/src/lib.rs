//! Site Headcount Bot Library
//!
//! A Telegram bot that walks an operator through the daily construction-site
//! headcount, one work category at a time, and appends each completed report
//! to a CSV log. Two reminders a day nudge the operator to start.
//!
//! ## Key Components
//!
//! - **CategoryRegistry**: ordered categories with per-category maxima
//! - **SessionManager**: per-chat progress through the categories
//! - **HeadcountBot**: command routing, replies and persistence on completion
//! - **ReportLog**: CSV append via read, rewrite and atomic rename
//! - **ReminderScheduler**: daily reminders at fixed local times
//! - **Adapters**: Telegram Bot API client behind the `ChatAdapter` trait
//! - **Daemon**: CLI entry point with tracing, polling and graceful shutdown
//!
//! ## Usage
//!
//! ```rust,ignore
//! use headcount_bot::{daemon, DaemonCli};
//! use clap::Parser;
//!
//! # async fn example() -> anyhow::Result<()> {
//! daemon::run(DaemonCli::parse()).await
//! # }
//! ```

pub mod adapter;
pub mod bot;
pub mod config;
pub mod daemon;
pub mod error;
pub mod format;
pub mod message;
pub mod registry;
pub mod report;
pub mod scheduler;
pub mod session;
pub mod store;
pub mod validate;

pub use adapter::{
    telegram::TelegramAdapter, AdapterStatus, ChatAdapter, OutgoingMessage, SendReceipt,
    UpdateBatch,
};
pub use bot::{Command, Dispatch, HeadcountBot};
pub use config::{HeadcountConfig, ReminderConfig, TelegramConfig};
pub use error::{HeadcountError, PersistenceError, Result};
pub use message::{ChatId, InboundMessage, Participant, ParticipantRole};
pub use registry::{Category, CategoryRegistry};
pub use report::{assemble, Report, ReportRow};
pub use scheduler::{ReminderSchedule, ReminderScheduler};
pub use session::{Session, SessionManager, SessionState, Submission};
pub use store::ReportLog;
pub use validate::{validate_and_advance, Advance, Rejection};

pub use daemon::{init_tracing as daemon_init_tracing, run as daemon_run, Cli as DaemonCli};
