use std::{future::Future, path::PathBuf, sync::Arc, time::Duration};

use crate::{
    adapter::{telegram::TelegramAdapter, ChatAdapter},
    bot::HeadcountBot,
    config::HeadcountConfig,
    message::ChatId,
    registry::CategoryRegistry,
    scheduler::ReminderScheduler,
    store::ReportLog,
};
use anyhow::{Context, Result};
use clap::Parser;
use tokio::{signal, sync::watch, time::sleep};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Parser, Clone)]
#[command(author, version, about = "Daily construction-site headcount bot", long_about = None)]
pub struct Cli {
    /// Telegram Bot API token (from @BotFather)
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    bot_token: String,

    /// Optional TOML file with categories, storage and reminder settings
    #[arg(long, env = "HEADCOUNT_CONFIG")]
    config: Option<PathBuf>,

    /// Overrides the CSV log location from the config file
    #[arg(long, env = "HEADCOUNT_STORAGE_PATH")]
    storage_path: Option<PathBuf>,

    /// Overrides the reminder recipient from the config file
    #[arg(long, env = "HEADCOUNT_REMINDER_CHAT_ID", allow_negative_numbers = true)]
    reminder_chat_id: Option<i64>,

    /// Long-poll timeout in seconds (Telegram server holds connection open)
    #[arg(long, env = "TELEGRAM_POLL_TIMEOUT_SECS")]
    poll_timeout_secs: Option<u64>,
}

impl Cli {
    /// Loads the config file (or defaults) and layers CLI/env overrides on top.
    pub fn resolve_config(&self) -> Result<HeadcountConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config at {}", path.display()))?;
                HeadcountConfig::from_toml_str(&raw)
                    .with_context(|| format!("failed to parse config at {}", path.display()))?
            }
            None => HeadcountConfig::default(),
        };

        config.telegram.bot_token = self.bot_token.clone();
        if let Some(path) = &self.storage_path {
            config.storage_path = path.clone();
        }
        if let Some(chat_id) = self.reminder_chat_id {
            config.reminder.chat_id = Some(ChatId(chat_id));
        }
        if let Some(secs) = self.poll_timeout_secs {
            config.telegram.poll_timeout_secs = secs;
        }
        Ok(config)
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = cli.resolve_config()?;

    let registry = Arc::new(
        CategoryRegistry::new(config.categories.clone()).context("invalid category list")?,
    );
    let log = ReportLog::new(&config.storage_path, registry.header(&config.date_column));
    match log.load() {
        Ok(rows) => info!(path = %log.path().display(), rows = rows.len(), "Report log ready"),
        Err(err) => warn!(error = %err, "Report log unreadable; appends will fail until fixed"),
    }

    let adapter: Arc<dyn ChatAdapter> = Arc::new(
        TelegramAdapter::new(config.telegram.clone()).context("failed to build Telegram adapter")?,
    );
    let username = match adapter.health_check().await {
        Ok(status) if status.is_online => {
            info!(bot = status.details.as_deref().unwrap_or("unknown"), "Telegram bot online");
            status.username
        }
        Ok(status) => {
            warn!(details = ?status.details, "Telegram getMe reported the bot offline");
            None
        }
        Err(err) => {
            warn!(error = %err, "Telegram health check failed");
            None
        }
    };
    if username.is_none() {
        warn!("Bot username unknown; commands addressed to other bots will be handled");
    }

    info!(
        categories = registry.len(),
        storage = %config.storage_path.display(),
        "Starting headcount bot"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let reminders = match ReminderScheduler::from_config(Arc::clone(&adapter), &config.reminder)
        .context("invalid reminder settings")?
    {
        Some(scheduler) => Some(tokio::spawn(scheduler.run(shutdown_rx))),
        None => {
            info!("No reminder recipient configured; daily reminders disabled");
            None
        }
    };

    let mut bot = HeadcountBot::new(Arc::clone(&adapter), registry, log);
    if let Some(username) = username {
        bot = bot.with_username(username);
    }
    let poll_timeout = Duration::from_secs(config.telegram.poll_timeout_secs);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut offset: Option<i64> = None;
    let mut consecutive_errors: u32 = 0;

    loop {
        let polled = tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown signal received; exiting");
                break;
            }
            polled = adapter.fetch_updates(offset, poll_timeout) => polled,
        };

        match polled {
            Ok(batch) => {
                consecutive_errors = 0;
                offset = batch.next_offset;
                if !batch.messages.is_empty() {
                    debug!(count = batch.messages.len(), "Processing Telegram updates");
                }
                for message in batch.messages {
                    let chat_id = message.chat_id;
                    if let Err(err) = bot.handle(message).await {
                        error!(%chat_id, error = %err, "Failed to handle message");
                    }
                }
            }
            Err(err) => {
                consecutive_errors += 1;
                let backoff = Duration::from_secs((2u64).pow(consecutive_errors.min(5)));
                error!(
                    error = %err,
                    consecutive_errors,
                    backoff_secs = backoff.as_secs(),
                    "Telegram poll failed"
                );
                if backoff_or_shutdown(backoff, &mut shutdown).await {
                    info!("Shutdown signal received during backoff; exiting");
                    break;
                }
            }
        }
    }

    let _ = shutdown_tx.send(true);
    if let Some(handle) = reminders {
        if let Err(err) = handle.await {
            warn!(error = ?err, "Reminder task ended abnormally");
        }
    }

    Ok(())
}

/// Sleeps for `delay` unless `shutdown` resolves first. `true` means shutdown.
async fn backoff_or_shutdown<F>(delay: Duration, shutdown: &mut F) -> bool
where
    F: Future<Output = ()> + Unpin,
{
    tokio::select! {
        _ = shutdown => true,
        _ = sleep(delay) => false,
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to listen for CTRL+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
