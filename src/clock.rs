//! Civil time for attendance: a fixed UTC+7 offset with no daylight saving.
//!
//! Every "today"/"late" decision and every timestamp we hand back to clients is
//! expressed in this zone, while storage stays in UTC.

use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDateTime, NaiveTime, SecondsFormat, TimeDelta,
    TimeZone, Utc,
};
use thiserror::Error;

pub const CIVIL_UTC_OFFSET_SECS: i32 = 7 * 60 * 60;

/// Stored timestamps are fixed-width text, so only four-digit UTC years fit.
const STORABLE_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid timestamp format: {raw:?}")]
pub struct TimestampError {
    pub raw: String,
}

pub fn civil_offset() -> FixedOffset {
    FixedOffset::east_opt(CIVIL_UTC_OFFSET_SECS).expect("UTC+7 is within the valid offset range")
}

pub fn to_civil(t: DateTime<Utc>) -> DateTime<FixedOffset> {
    t.with_timezone(&civil_offset())
}

/// RFC 3339 in civil time, e.g. `2026-10-18T07:00:00.000+07:00`.
pub fn format_civil(t: DateTime<Utc>) -> String {
    to_civil(t).to_rfc3339_opts(SecondsFormat::Millis, false)
}

/// UTC instant of local midnight on the civil date containing `now`.
pub fn civil_day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let since_midnight = to_civil(now).time().signed_duration_since(NaiveTime::MIN);
    now - since_midnight
}

/// Accepts RFC 3339 with any offset. A timestamp without an offset is read as
/// civil time. The UTC result must fall in years 0000..=9999.
pub fn parse_scan_timestamp(raw: &str) -> Result<DateTime<Utc>, TimestampError> {
    let invalid = || TimestampError {
        raw: raw.to_string(),
    };
    let t = raw.trim();
    let parsed = match DateTime::parse_from_rfc3339(t) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(_) => NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(t, fmt).ok())
            .ok_or_else(invalid)
            .and_then(|naive| civil_from_naive(naive).ok_or_else(invalid))?,
    };
    if !STORABLE_YEARS.contains(&parsed.year()) {
        return Err(invalid());
    }
    Ok(parsed)
}

fn civil_from_naive(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    naive
        .checked_sub_signed(TimeDelta::seconds(i64::from(CIVIL_UTC_OFFSET_SECS)))
        .map(|utc| Utc.from_utc_datetime(&utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s)
            .expect("fixture timestamp")
            .with_timezone(&Utc)
    }

    #[test]
    fn formats_in_civil_time_with_offset_suffix() {
        let t = utc("2026-10-18T00:00:00Z");
        assert_eq!(format_civil(t), "2026-10-18T07:00:00.000+07:00");
    }

    #[test]
    fn civil_conversion_crosses_the_date_line() {
        let local = to_civil(utc("2026-10-17T18:30:00Z"));
        assert_eq!(local.day(), 18);
        assert_eq!(local.hour(), 1);
        assert_eq!(local.minute(), 30);
    }

    #[test]
    fn day_start_is_local_midnight() {
        // 2026-10-18 01:30 local
        let now = utc("2026-10-17T18:30:00Z");
        assert_eq!(civil_day_start(now), utc("2026-10-17T17:00:00Z"));

        // 2026-10-17 23:59 local
        let now = utc("2026-10-17T16:59:00Z");
        assert_eq!(civil_day_start(now), utc("2026-10-16T17:00:00Z"));
    }

    #[test]
    fn parses_offsets_and_naive_civil_times() {
        assert_eq!(
            parse_scan_timestamp("2026-10-18T07:01:00+07:00"),
            Ok(utc("2026-10-18T00:01:00Z"))
        );
        assert_eq!(
            parse_scan_timestamp("2026-10-18T00:01:00.250Z"),
            Ok(utc("2026-10-18T00:01:00.250Z"))
        );
        assert_eq!(
            parse_scan_timestamp("2026-10-18 07:01:00"),
            Ok(utc("2026-10-18T00:01:00Z"))
        );
        assert_eq!(
            parse_scan_timestamp(" 2026-10-18T07:01 "),
            Ok(utc("2026-10-18T00:01:00Z"))
        );
    }

    #[test]
    fn rejects_garbage() {
        let e = parse_scan_timestamp("yesterday-ish").expect_err("must fail");
        assert_eq!(e.raw, "yesterday-ish");
        assert!(parse_scan_timestamp("2026-13-01T00:00:00Z").is_err());
        // Near chrono's minimum year, shifting to UTC would overflow.
        assert!(parse_scan_timestamp("-262143-01-01T00:00:00").is_err());
    }

    #[test]
    fn rejects_years_that_leave_four_digits_in_utc() {
        assert!(parse_scan_timestamp("0000-01-01T03:00:00").is_err());
        assert!(parse_scan_timestamp("9999-12-31T23:30:00-05:00").is_err());
        assert!(parse_scan_timestamp("+10000-01-01T00:00:00Z").is_err());
        assert_eq!(
            parse_scan_timestamp("0000-01-01T07:00:00"),
            Ok(utc("0000-01-01T00:00:00Z"))
        );
        assert_eq!(
            parse_scan_timestamp("9999-12-31T23:59:59Z"),
            Ok(utc("9999-12-31T23:59:59Z"))
        );
    }
}
