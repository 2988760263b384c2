//! Parsing and bounds checking of a single answer.

use crate::error::{HeadcountError, Result};
use crate::registry::CategoryRegistry;
use crate::session::Session;
use std::num::IntErrorKind;

/// Outcome of an accepted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The session now waits on the category at this index.
    Next(usize),
    /// Every category has an answer.
    Completed,
}

/// Why an answer was refused. The session is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    InvalidFormat,
    OutOfRange { max: u32 },
}

/// Result of parsing operator text before any bound is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedCount {
    Value(i64),
    /// A well-formed integer too large in magnitude for `i64`.
    Overflow,
}

pub fn parse_count(raw: &str) -> Option<ParsedCount> {
    match raw.trim().parse::<i64>() {
        Ok(value) => Some(ParsedCount::Value(value)),
        Err(err) => match err.kind() {
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => Some(ParsedCount::Overflow),
            _ => None,
        },
    }
}

/// Checks `raw_text` against the session's current category and records it.
///
/// The outer error means the session has no category left to answer. The
/// inner result is the verdict on the answer itself; only the accepting path
/// mutates `session`.
pub fn validate_and_advance(
    session: &mut Session,
    registry: &CategoryRegistry,
    raw_text: &str,
) -> Result<std::result::Result<Advance, Rejection>> {
    let index = session.current_index();
    let category = registry.get(index).ok_or(HeadcountError::SessionExhausted {
        index,
        len: registry.len(),
    })?;

    let value = match bounded_count(raw_text, category.max_value) {
        Ok(Some(value)) => value,
        Ok(None) => {
            return Ok(Err(Rejection::OutOfRange {
                max: category.max_value,
            }))
        }
        Err(rejection) => return Ok(Err(rejection)),
    };

    session.record(&category.name, value);

    if session.current_index() < registry.len() {
        Ok(Ok(Advance::Next(session.current_index())))
    } else {
        Ok(Ok(Advance::Completed))
    }
}

/// `Err` for text that is not an integer, `None` for one outside `0..=max`.
fn bounded_count(raw_text: &str, max: u32) -> std::result::Result<Option<u32>, Rejection> {
    match parse_count(raw_text).ok_or(Rejection::InvalidFormat)? {
        ParsedCount::Value(value) => Ok(u32::try_from(value).ok().filter(|v| *v <= max)),
        ParsedCount::Overflow => Ok(None),
    }
}
