/// Human-friendly durations, ages and byte sizes.
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const YEAR: i64 = 365 * DAY;

/// Describe a span of time without direction: `a moment`, `5 minutes`, `an hour`.
#[must_use]
pub fn natural_delta(delta: TimeDelta) -> String {
    let secs = delta.num_seconds().abs();

    match secs {
        0 => "a moment".to_owned(),
        1 => "a second".to_owned(),
        s if s < MINUTE => format!("{s} seconds"),
        s if s < 2 * MINUTE => "a minute".to_owned(),
        s if s < HOUR => format!("{} minutes", s / MINUTE),
        s if s < 2 * HOUR => "an hour".to_owned(),
        s if s < DAY => format!("{} hours", s / HOUR),
        s if s < 2 * DAY => "a day".to_owned(),
        s if s < YEAR => format!("{} days", s / DAY),
        s if s < 2 * YEAR => "a year".to_owned(),
        s => format!("{} years", s / YEAR),
    }
}

/// Describe how long ago (or how far ahead) `delta` is: `5 minutes ago`, `now`.
///
/// `delta` is `now - then`, so positive values are in the past.
#[must_use]
pub fn natural_time(delta: TimeDelta) -> String {
    let phrase = natural_delta(delta);
    if phrase == "a moment" {
        "now".to_owned()
    } else if delta < TimeDelta::zero() {
        format!("{phrase} from now")
    } else {
        format!("{phrase} ago")
    }
}

/// Format a byte count with decimal units: `999 Bytes`, `1.0 kB`, `1.2 MB`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn natural_size(bytes: f64) -> String {
    const UNITS: [&str; 8] = ["kB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];
    const BASE: f64 = 1000.0;

    let abs = bytes.abs();
    if (abs - 1.0).abs() < f64::EPSILON {
        return format!("{bytes:.0} Byte");
    }
    if abs < BASE {
        return format!("{bytes:.0} Bytes");
    }

    let mut unit = UNITS[0];
    let mut scaled = bytes / BASE;
    for next in &UNITS[1..] {
        if scaled.abs() < BASE {
            break;
        }
        scaled /= BASE;
        unit = next;
    }
    format!("{scaled:.1} {unit}")
}

/// Parse an ISO-8601 timestamp as UTC. Naive timestamps are taken to be UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Age of an ISO timestamp relative to `now`, e.g. `3 hours ago`.
#[must_use]
pub fn age(raw: &str, now: DateTime<Utc>) -> Option<String> {
    parse_timestamp(raw).map(|then| natural_time(now - then))
}
