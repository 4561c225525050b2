use chrono::{DateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use thiserror::Error;

#[derive(Debug, Error)]
/// Errors produced by local-time resolution.
pub enum TimeError {
    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),
}

/// Returns the current UTC instant.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Converts a UTC instant into a zone-aware local time for an IANA zone name.
pub fn to_local(utc: DateTime<Utc>, tz_name: &str) -> Result<DateTime<Tz>, TimeError> {
    let tz: Tz = tz_name
        .parse()
        .map_err(|_| TimeError::UnknownTimezone(tz_name.to_string()))?;
    Ok(utc.with_timezone(&tz))
}

/// Reports whether `local` falls inside the daily push window centered on
/// `target_hour:00` with a half-width of `window_minutes`.
///
/// The comparison runs at whole-minute granularity and is inclusive on both
/// minute edges, so hour 7 with a 7-minute window accepts 06:53:00.000
/// through 07:07:59.999. The window never wraps a day boundary: for a
/// target hour of 0 or 23 the half of the window that would land on the
/// other side of midnight is not matched.
pub fn in_push_window<Z: TimeZone>(local: &DateTime<Z>, target_hour: u32, window_minutes: i64) -> bool {
    let target = local
        .clone()
        .with_hour(target_hour)
        .and_then(|t| t.with_minute(0))
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0));
    let local_minute = local
        .clone()
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0));
    let (Some(target), Some(local_minute)) = (target, local_minute) else {
        // Unrepresentable local time (e.g. inside a DST gap).
        return false;
    };

    let delta = local_minute - target;
    delta.num_seconds().abs() <= window_minutes * 60
}
