//! Daily reminder delivery at fixed local times.

use crate::adapter::{ChatAdapter, OutgoingMessage};
use crate::config::ReminderConfig;
use crate::error::{HeadcountError, Result};
use crate::message::ChatId;
use chrono::{DateTime, Days, Local, NaiveTime, TimeZone};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderSchedule {
    times: Vec<NaiveTime>,
}

impl ReminderSchedule {
    /// Parses `HH:MM` entries. Duplicates collapse; order does not matter.
    pub fn parse<S: AsRef<str>>(times: &[S]) -> Result<Self> {
        let mut parsed = times
            .iter()
            .map(|raw| {
                let raw = raw.as_ref().trim();
                NaiveTime::parse_from_str(raw, "%H:%M").map_err(|err| {
                    HeadcountError::InvalidConfig(format!("invalid reminder time `{raw}`: {err}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        parsed.sort();
        parsed.dedup();
        Ok(Self { times: parsed })
    }

    pub fn times(&self) -> &[NaiveTime] {
        &self.times
    }

    /// First configured wall-clock time strictly after `now`, in `now`'s zone.
    ///
    /// Times that do not exist on a given day (DST gap) are skipped for that
    /// day; ambiguous ones fire at their earlier instant.
    pub fn next_fire<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let tz = now.timezone();
        let today = now.date_naive();
        // Two days always suffice unless every time falls into a gap; allow one more.
        (0..3u64)
            .filter_map(|offset| today.checked_add_days(Days::new(offset)))
            .flat_map(|day| self.times.iter().map(move |t| day.and_time(*t)))
            .filter_map(|naive| tz.from_local_datetime(&naive).earliest())
            .find(|candidate| candidate > now)
    }
}

pub struct ReminderScheduler {
    adapter: Arc<dyn ChatAdapter>,
    schedule: ReminderSchedule,
    recipient: ChatId,
    text: String,
}

impl ReminderScheduler {
    /// `None` when no recipient is configured.
    pub fn from_config(adapter: Arc<dyn ChatAdapter>, config: &ReminderConfig) -> Result<Option<Self>> {
        let schedule = ReminderSchedule::parse(&config.times)?;
        Ok(config.chat_id.map(|recipient| Self {
            adapter,
            schedule,
            recipient,
            text: config.text.clone(),
        }))
    }

    /// Sends one reminder. Failures are logged and not retried.
    pub async fn fire(&self) -> bool {
        match self
            .adapter
            .send_message(OutgoingMessage::new(self.recipient, self.text.clone()))
            .await
        {
            Ok(receipt) => {
                info!(chat_id = %self.recipient, message_id = %receipt.message_id, "Reminder sent");
                true
            }
            Err(err) => {
                error!(chat_id = %self.recipient, error = %err, "Failed to send reminder");
                false
            }
        }
    }

    /// Runs until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let times: Vec<String> = self
            .schedule
            .times()
            .iter()
            .map(|t| t.format("%H:%M").to_string())
            .collect();
        info!(chat_id = %self.recipient, ?times, "Reminder scheduler started");

        loop {
            let now = Local::now();
            let Some(next) = self.schedule.next_fire(&now) else {
                info!("No reminder times configured; scheduler idle");
                return;
            };
            let wait = (next.clone() - now).to_std().unwrap_or_default();
            info!(next = %next.format("%Y-%m-%d %H:%M"), "Next reminder scheduled");

            tokio::select! {
                _ = sleep(wait) => {
                    self.fire().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Reminder scheduler stopping");
                        return;
                    }
                }
            }
        }
    }
}
