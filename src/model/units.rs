//! Unit conversion between the remote server and the local store.
//!
//! The remote server reports positions in milliseconds and dates as Unix
//! seconds. The local store keeps positions in (fractional) seconds and
//! dates as local wall-clock `YYYY-MM-DD HH:MM:SS` strings. Positions travel
//! through the crate as [`Duration`] so neither side's unit leaks.

use chrono::{DateTime, Local, NaiveDateTime};
use std::time::Duration;

/// Date format of the local store's `lastPlayed` column.
pub const LOCAL_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A remote position in milliseconds.
#[must_use]
pub const fn from_remote_ms(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

/// A position in the local store's unit (seconds).
#[must_use]
pub fn to_local_seconds(position: Duration) -> f64 {
    position.as_secs_f64()
}

/// A remote Unix timestamp as local wall-clock time.
///
/// Returns `None` for timestamps chrono cannot represent.
#[must_use]
pub fn remote_epoch_to_local(unix_secs: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(unix_secs, 0).map(|utc| utc.with_timezone(&Local).naive_local())
}

/// Render a local date the way the local store expects it.
#[must_use]
pub fn format_local_date(date: &NaiveDateTime) -> String {
    date.format(LOCAL_DATE_FORMAT).to_string()
}

/// Interpret a loosely typed count (number, numeric string or null).
///
/// Anything that is not a non-negative integer is treated as absent.
#[must_use]
pub fn lenient_count(value: &serde_json::Value) -> Option<i64> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match parsed {
        Some(n) if n >= 0 => Some(n),
        _ => {
            if !value.is_null() {
                tracing::debug!(%value, "ignoring unparseable count");
            }
            None
        }
    }
}

/// Interpret a loosely typed millisecond position.
///
/// Integers, numeric strings and non-negative floats are accepted, with any
/// fraction of a millisecond dropped. Anything else reads as 0.
#[must_use]
pub fn lenient_millis(value: &serde_json::Value) -> u64 {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(whole_ms)),
        serde_json::Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole_ms))
        }
        _ => None,
    };
    parsed.unwrap_or_else(|| {
        if !value.is_null() {
            tracing::debug!(%value, "ignoring unparseable position");
        }
        0
    })
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn whole_ms(ms: f64) -> Option<u64> {
    (ms.is_finite() && ms >= 0.0 && ms < u64::MAX as f64).then(|| ms.trunc() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_whole_seconds_are_lossless() {
        let position = from_remote_ms(300_000);
        assert!((to_local_seconds(position) - 300.0).abs() < f64::EPSILON);
        assert_eq!(position, Duration::from_secs(300));
    }

    #[test]
    fn test_remote_epoch_round_trips_through_local_format() {
        let local = remote_epoch_to_local(1_700_000_000).unwrap();
        let rendered = format_local_date(&local);
        assert_eq!(rendered.len(), 19);

        let parsed = NaiveDateTime::parse_from_str(&rendered, LOCAL_DATE_FORMAT).unwrap();
        let back = parsed
            .and_local_timezone(Local)
            .earliest()
            .unwrap()
            .timestamp();
        assert_eq!(back, 1_700_000_000);
    }

    #[test]
    fn test_lenient_count() {
        assert_eq!(lenient_count(&json!(3)), Some(3));
        assert_eq!(lenient_count(&json!("4")), Some(4));
        assert_eq!(lenient_count(&json!(null)), None);
        assert_eq!(lenient_count(&json!("many")), None);
        assert_eq!(lenient_count(&json!(-1)), None);
        assert_eq!(lenient_count(&json!(2.5)), None);
    }

    #[test]
    fn test_lenient_millis_accepts_float_positions() {
        assert_eq!(lenient_millis(&json!(300_000)), 300_000);
        assert_eq!(lenient_millis(&json!(300_000.0)), 300_000);
        assert_eq!(lenient_millis(&json!(1500.7)), 1500);
        assert_eq!(lenient_millis(&json!("42")), 42);
        assert_eq!(lenient_millis(&json!(" 42.0 ")), 42);
        assert_eq!(lenient_millis(&json!(null)), 0);
        assert_eq!(lenient_millis(&json!(-5)), 0);
        assert_eq!(lenient_millis(&json!("soon")), 0);
    }
}
