//! Date/time utilities for noticeboard.
//!
//! Comment times are stored as integer microseconds since the Unix epoch
//! and shown in the server timezone.

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;

/// Display format for comment timestamps.
pub const COMMENT_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Naive formats accepted by [`parse_since`], tried in order.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Convert a UTC datetime to stored microseconds.
pub fn to_micros(dt: &DateTime<Utc>) -> i64 {
    dt.timestamp_micros()
}

/// Convert stored microseconds back to a UTC datetime.
///
/// Out-of-range values clamp to the epoch.
pub fn from_micros(micros: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(micros).unwrap_or_default()
}

/// Format stored microseconds as `YYYY/MM/DD HH:MM:SS` in `tz`.
pub fn format_comment_time(micros: i64, tz: Tz) -> String {
    from_micros(micros)
        .with_timezone(&tz)
        .format(COMMENT_TIME_FORMAT)
        .to_string()
}

/// Format stored microseconds as RFC 3339 in `tz`, keeping microseconds.
///
/// This is the value clients send back as `last_timestamp`.
pub fn to_rfc3339(micros: i64, tz: Tz) -> String {
    from_micros(micros)
        .with_timezone(&tz)
        .to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Parse a client-supplied ISO-8601 timestamp.
///
/// Accepts RFC 3339 (with `Z` or an offset), naive date-times with a `T`
/// or space separator and optional seconds/fraction, and a bare date.
/// Naive values are interpreted in `tz`. Returns `None` if the input is
/// malformed or names a local time that does not exist in `tz`.
pub fn parse_since(input: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }
    // ISO-8601 offsets without the colon, e.g. +0900.
    if let Ok(dt) = DateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_micros_roundtrip() {
        let dt = utc(2024, 1, 15, 10, 30, 0) + chrono::Duration::microseconds(123_456);
        assert_eq!(from_micros(to_micros(&dt)), dt);
    }

    #[test]
    fn test_format_comment_time_utc() {
        let micros = to_micros(&utc(2024, 1, 15, 10, 30, 5));
        assert_eq!(format_comment_time(micros, chrono_tz::UTC), "2024/01/15 10:30:05");
    }

    #[test]
    fn test_format_comment_time_tokyo() {
        let micros = to_micros(&utc(2024, 1, 15, 10, 30, 5));
        assert_eq!(
            format_comment_time(micros, chrono_tz::Asia::Tokyo),
            "2024/01/15 19:30:05"
        );
    }

    #[test]
    fn test_to_rfc3339_keeps_micros() {
        let dt = utc(2024, 1, 15, 10, 30, 0) + chrono::Duration::microseconds(42);
        let s = to_rfc3339(to_micros(&dt), chrono_tz::UTC);
        assert_eq!(s, "2024-01-15T10:30:00.000042+00:00");
        assert_eq!(parse_since(&s, chrono_tz::UTC), Some(dt));
    }

    #[test]
    fn test_parse_since_rfc3339() {
        assert_eq!(
            parse_since("2024-01-15T10:30:00Z", chrono_tz::UTC),
            Some(utc(2024, 1, 15, 10, 30, 0))
        );
        assert_eq!(
            parse_since("2024-01-15T19:30:00+09:00", chrono_tz::UTC),
            Some(utc(2024, 1, 15, 10, 30, 0))
        );
    }

    #[test]
    fn test_parse_since_compact_offset() {
        assert_eq!(
            parse_since("2024-01-15T19:30:00+0900", chrono_tz::UTC),
            Some(utc(2024, 1, 15, 10, 30, 0))
        );
    }

    #[test]
    fn test_parse_since_naive_uses_timezone() {
        assert_eq!(
            parse_since("2024-01-15T19:30:00", chrono_tz::Asia::Tokyo),
            Some(utc(2024, 1, 15, 10, 30, 0))
        );
        assert_eq!(
            parse_since("2024-01-15 10:30", chrono_tz::UTC),
            Some(utc(2024, 1, 15, 10, 30, 0))
        );
        assert_eq!(
            parse_since("2024-01-15T10:30:00.500000", chrono_tz::UTC),
            Some(utc(2024, 1, 15, 10, 30, 0) + chrono::Duration::milliseconds(500))
        );
    }

    #[test]
    fn test_parse_since_bare_date() {
        assert_eq!(
            parse_since("2024-01-15", chrono_tz::UTC),
            Some(utc(2024, 1, 15, 0, 0, 0))
        );
    }

    #[test]
    fn test_parse_since_malformed() {
        assert_eq!(parse_since("not a date", chrono_tz::UTC), None);
        assert_eq!(parse_since("2024-13-01T00:00:00", chrono_tz::UTC), None);
        assert_eq!(parse_since("", chrono_tz::UTC), None);
    }

    #[test]
    fn test_parse_since_nonexistent_local_time() {
        // 02:30 is skipped when New York springs forward.
        assert_eq!(
            parse_since("2024-03-10T02:30:00", chrono_tz::America::New_York),
            None
        );
    }
}
