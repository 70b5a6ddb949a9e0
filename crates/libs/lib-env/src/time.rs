//! # Time Utilities
//!
//! UTC clock readings and RFC3339 conversion using chrono.
//!
//! Text produced here is RFC3339 with up to nine fractional digits. Trailing
//! zeros are dropped, as is a zero fraction, and UTC is written as `Z`:
//! `2024-01-02T03:04:05Z`, `1970-01-01T00:00:01.5Z`.

use chrono::{DateTime, SecondsFormat, TimeZone, Timelike, Utc};
use thiserror::Error;

const NANOS_PER_SEC: i64 = 1_000_000_000;
const NANOS_PER_MILLI: i64 = 1_000_000;

/// Get current UTC time.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Nanoseconds since the Unix epoch.
pub fn nanos_since_epoch() -> i64 {
    nanos_from(&now())
}

pub fn millis_since_epoch() -> i64 {
    millis_from(nanos_since_epoch())
}

/// Whole seconds since the Unix epoch, from a separate clock reading.
pub fn secs_since_epoch() -> i64 {
    now().timestamp()
}

/// Truncating conversion of a nanosecond count to milliseconds.
pub fn millis_from(nanos: i64) -> i64 {
    nanos / NANOS_PER_MILLI
}

/// Format a base-10 nanosecond epoch string as RFC3339 in UTC.
///
/// Returns an empty string when `input` is not a valid `i64`.
pub fn format_nanos_string(input: &str) -> String {
    let Ok(nanos) = input.parse::<i64>() else {
        return String::new();
    };

    // Euclidean split keeps the remainder non-negative for pre-epoch values.
    let secs = nanos.div_euclid(NANOS_PER_SEC);
    let subsec = nanos.rem_euclid(NANOS_PER_SEC) as u32;

    match DateTime::from_timestamp(secs, subsec) {
        Some(time) => to_epoch_text(&time),
        None => String::new(),
    }
}

/// Format a time as RFC3339 with nanosecond precision.
pub fn to_epoch_text<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let mut text = time.to_rfc3339_opts(SecondsFormat::Secs, true);

    // leap seconds carry an extra second in the nanosecond field
    let nanos = time.nanosecond() % NANOS_PER_SEC as u32;
    if nanos != 0 {
        let fraction = format!(".{nanos:09}");
        let fraction = fraction.trim_end_matches('0');
        // the offset (`Z`, `+hh:mm` or `-hh:mm`) is the last sign in the text
        let offset_at = text
            .rfind(|c: char| c == 'Z' || c == '+' || c == '-')
            .unwrap_or(text.len());
        text.insert_str(offset_at, fraction);
    }

    text
}

/// Parse RFC3339 text to UTC DateTime.
///
/// Only the canonical form is accepted: an uppercase `T` between date and
/// time, and an uppercase `Z` for UTC.
pub fn from_epoch_text(input: &str) -> Result<DateTime<Utc>, Error> {
    let canonical = input.as_bytes().get(10) == Some(&b'T') && !input.ends_with('z');
    if !canonical {
        return Err(Error::NonCanonical {
            input: input.to_string(),
        });
    }

    DateTime::parse_from_rfc3339(input)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| Error::FailToDateParse {
            input: input.to_string(),
            source,
        })
}

/// Nanoseconds since the Unix epoch for `time`, saturating outside the `i64` range.
pub fn nanos_from(time: &DateTime<Utc>) -> i64 {
    time.timestamp()
        .saturating_mul(NANOS_PER_SEC)
        .saturating_add(i64::from(time.timestamp_subsec_nanos()))
}

// region:    --- Error
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to parse timestamp {input:?}: {source}")]
    FailToDateParse {
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("timestamp {input:?} is not RFC3339 with 'T' and 'Z' separators")]
    NonCanonical { input: String },
}
// endregion: --- Error

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_now_is_utc() {
        let before = nanos_since_epoch();
        let current = now();
        let after = nanos_since_epoch();

        assert_eq!(current.timezone(), Utc);
        assert!(nanos_from(&current) >= before);
        assert!(nanos_from(&current) <= after);
    }

    #[test]
    fn test_clock_representations_agree() {
        let secs = secs_since_epoch();
        let millis = millis_since_epoch();

        // readings are taken separately, so allow a little skew
        assert!((millis / 1000 - secs).abs() <= 1);
    }

    #[test]
    fn test_millis_from() {
        assert_eq!(millis_from(1_500_000_000), 1_500);
        assert_eq!(millis_from(999_999), 0);
        assert_eq!(millis_from(-1_999_999), -1);
        assert_eq!(millis_from(0), 0);
    }

    #[test]
    fn test_format_nanos_string() {
        assert_eq!(format_nanos_string("0"), "1970-01-01T00:00:00Z");
        assert_eq!(format_nanos_string("1500000000"), "1970-01-01T00:00:01.5Z");
        assert_eq!(format_nanos_string("1000"), "1970-01-01T00:00:00.000001Z");
        assert_eq!(
            format_nanos_string("1704164645000000006"),
            "2024-01-02T03:04:05.000000006Z"
        );
        assert_eq!(format_nanos_string("-1"), "1969-12-31T23:59:59.999999999Z");
    }

    #[test]
    fn test_format_nanos_string_invalid() {
        for input in ["", "abc", "12.5", "1e9", "99999999999999999999"] {
            assert_eq!(format_nanos_string(input), "", "input: {input:?}");
        }
    }

    #[test]
    fn test_format_nanos_string_extremes() {
        assert!(!format_nanos_string(&i64::MAX.to_string()).is_empty());
        assert!(!format_nanos_string(&i64::MIN.to_string()).is_empty());
    }

    #[test]
    fn test_epoch_text_round_trip() {
        let time = Utc
            .with_ymd_and_hms(2024, 1, 2, 3, 4, 5)
            .unwrap()
            .with_nanosecond(123_456_789)
            .unwrap();

        let text = to_epoch_text(&time);
        assert_eq!(text, "2024-01-02T03:04:05.123456789Z");
        assert_eq!(from_epoch_text(&text).unwrap(), time);

        let current = now();
        assert_eq!(from_epoch_text(&to_epoch_text(&current)).unwrap(), current);
    }

    #[test]
    fn test_epoch_text_with_offset() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let time = offset.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

        let text = to_epoch_text(&time);
        assert_eq!(text, "2024-06-01T12:00:00+02:00");
        assert_eq!(from_epoch_text(&text).unwrap(), time.with_timezone(&Utc));
    }

    #[test]
    fn test_epoch_text_trims_fraction() {
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let time = offset
            .with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
            .unwrap()
            .with_nanosecond(120_000_000)
            .unwrap();

        let text = to_epoch_text(&time);
        assert_eq!(text, "2024-06-01T12:00:00.12-05:00");
        assert_eq!(from_epoch_text(&text).unwrap(), time.with_timezone(&Utc));
    }

    #[test]
    fn test_from_epoch_text_rejects_loose_separators() {
        for input in [
            "2024-01-02 03:04:05Z",
            "2024-01-02t03:04:05Z",
            "2024-01-02T03:04:05z",
            "2024-01-02",
        ] {
            let err = from_epoch_text(input).unwrap_err();
            assert!(matches!(err, Error::NonCanonical { .. }), "input: {input:?}");
        }
        assert!(from_epoch_text("2024-01-02T03:04:05Z").is_ok());
    }

    #[test]
    fn test_from_epoch_text_invalid() {
        let err = from_epoch_text("2024-13-01T00:00:00Z").unwrap_err();
        assert!(
            matches!(err, Error::FailToDateParse { ref input, .. } if input == "2024-13-01T00:00:00Z")
        );
    }
}
