//! Date handling for log records.
//!
//! A record starts with `YYYY-MM-DD`; only that prefix is interpreted. Any
//! time of day, fractional seconds or zone that follows is payload.

use chrono::NaiveDate;

use crate::error::{ExtractError, Result};

/// Length of the `YYYY-MM-DD` prefix
pub const DATE_LEN: usize = 10;

/// Parse the strict `YYYY-MM-DD` date prefix of a record.
///
/// Returns `None` when the prefix is missing, misshapen or not a real
/// calendar date.
pub fn record_date(record: &[u8]) -> Option<NaiveDate> {
    let d = record.get(..DATE_LEN)?;
    if d[4] != b'-' || d[7] != b'-' {
        return None;
    }
    let year = digits(&d[0..4])?;
    let month = digits(&d[5..7])?;
    let day = digits(&d[8..10])?;
    NaiveDate::from_ymd_opt(year as i32, month, day)
}

fn digits(bytes: &[u8]) -> Option<u32> {
    bytes.iter().try_fold(0u32, |acc, &b| {
        b.is_ascii_digit().then(|| acc * 10 + (b - b'0') as u32)
    })
}

/// Validate a user supplied target date.
pub fn parse_target_date(s: &str) -> Result<NaiveDate> {
    if s.len() != DATE_LEN {
        return Err(ExtractError::config(format!(
            "invalid date '{s}': use YYYY-MM-DD"
        )));
    }
    record_date(s.as_bytes())
        .ok_or_else(|| ExtractError::config(format!("invalid date '{s}': use YYYY-MM-DD")))
}
