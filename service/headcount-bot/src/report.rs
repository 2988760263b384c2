//! Summary text and log row for a finished headcount.

use crate::error::{HeadcountError, Result};
use crate::registry::CategoryRegistry;
use crate::session::Session;
use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

/// Timestamp format of the date column; minute precision.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub timestamp: String,
    /// One `(category, value)` pair per registered category, in registry order.
    pub values: Vec<(String, u32)>,
}

impl ReportRow {
    /// Cells as written to the log: timestamp first, then every value.
    pub fn to_record(&self) -> Vec<String> {
        std::iter::once(self.timestamp.clone())
            .chain(self.values.iter().map(|(_, v)| v.to_string()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// `name: value` lines, registry order.
    pub summary: String,
    pub row: ReportRow,
}

/// Builds the report for a completed session as of `now`.
pub fn assemble<Tz>(session: &Session, registry: &CategoryRegistry, now: DateTime<Tz>) -> Result<Report>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    if !session.is_complete(registry) {
        return Err(HeadcountError::SessionIncomplete {
            answered: session.current_index(),
            len: registry.len(),
        });
    }

    let values: Vec<(String, u32)> = registry
        .names()
        .map(|name| (name.to_string(), session.answer(name).unwrap_or(0)))
        .collect();

    let summary = values
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join("\n");

    Ok(Report {
        summary,
        row: ReportRow {
            timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
            values,
        },
    })
}
