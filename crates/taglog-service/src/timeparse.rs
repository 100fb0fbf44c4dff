//! Parsing for user-supplied time strings on the dump entry points.

use chrono::{DateTime, NaiveTime, Utc};

use taglog_db::{Result, StoreError};

/// Parse `"SS"`, `"MM:SS"`, or `"HH:MM:SS"` into a duration in seconds.
pub fn parse_clock(s: &str) -> Result<i64> {
    let mut parts = Vec::with_capacity(3);
    for part in s.split(':') {
        let n: i64 = part
            .trim()
            .parse()
            .map_err(|_| StoreError::InvalidArgument(format!("bad time string: {s:?}")))?;
        parts.push(n);
    }
    match parts[..] {
        [seconds] => Ok(seconds),
        [minutes, seconds] => Ok(minutes * 60 + seconds),
        [hours, minutes, seconds] => Ok(hours * 3600 + minutes * 60 + seconds),
        _ => Err(StoreError::InvalidArgument(format!(
            "bad time string: {s:?}"
        ))),
    }
}

/// A clock time (`"19:00:00"`) is taken as today 00:00 UTC plus that
/// duration; anything else must be a unix timestamp.
pub fn parse_start_time(s: &str) -> Result<i64> {
    parse_start_time_at(s, Utc::now())
}

pub fn parse_start_time_at(s: &str, now: DateTime<Utc>) -> Result<i64> {
    if s.contains(':') {
        let seconds = parse_clock(s)?;
        let midnight = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        Ok(midnight.timestamp() + seconds)
    } else {
        s.parse()
            .map_err(|_| StoreError::InvalidArgument(format!("bad start time: {s:?}")))
    }
}
