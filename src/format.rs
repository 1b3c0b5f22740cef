//! Timestamp formatting for terminal output
//!
//! The warehouse runs on Colombia time (UTC-5, no daylight saving), so
//! absolute times are always shown in that zone with a 12-hour clock.
//! Timestamps without an offset are taken as UTC.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};

const COLOMBIA_UTC_OFFSET_SECS: i32 = 5 * 3600;
const NEVER: &str = "Never";
const INVALID: &str = "Invalid date";

fn colombia() -> FixedOffset {
    FixedOffset::west_opt(COLOMBIA_UTC_OFFSET_SECS).unwrap_or(Utc.fix())
}

/// Parse the timestamp forms the server produces
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Absolute time in Colombia, e.g. `05/03/2024 02:30:00 PM`
pub fn colombia_time(value: Option<&str>) -> String {
    let value = match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => return NEVER.to_string(),
    };
    match parse_timestamp(value) {
        Some(dt) => format_colombia(dt),
        None => INVALID.to_string(),
    }
}

fn format_colombia(dt: DateTime<Utc>) -> String {
    dt.with_timezone(&colombia())
        .format("%d/%m/%Y %I:%M:%S %p")
        .to_string()
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}

/// Human-friendly age relative to `now`; a week or older falls back to
/// the absolute time
pub fn relative_time(value: Option<&str>, now: DateTime<Utc>) -> String {
    let value = match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => return NEVER.to_string(),
    };
    let dt = match parse_timestamp(value) {
        Some(dt) => dt,
        None => return INVALID.to_string(),
    };

    let diff = now.signed_duration_since(dt);
    let minutes = diff.num_minutes();
    let hours = diff.num_hours();
    let days = diff.num_days();

    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        plural(minutes, "minute")
    } else if hours < 24 {
        plural(hours, "hour")
    } else if days < 7 {
        plural(days, "day")
    } else {
        format_colombia(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        parse_timestamp("2024-03-10T12:00:00Z").unwrap()
    }

    #[test]
    fn test_colombia_time() {
        assert_eq!(
            colombia_time(Some("2024-03-05T19:30:00Z")),
            "05/03/2024 02:30:00 PM"
        );
        // No offset: treated as UTC
        assert_eq!(
            colombia_time(Some("2024-03-05T04:05:06.789")),
            "04/03/2024 11:05:06 PM"
        );
        assert_eq!(colombia_time(None), "Never");
        assert_eq!(colombia_time(Some("  ")), "Never");
        assert_eq!(colombia_time(Some("yesterday")), "Invalid date");
    }

    #[test]
    fn test_relative_time_buckets() {
        let n = now();
        assert_eq!(relative_time(Some("2024-03-10T11:59:30Z"), n), "just now");
        assert_eq!(relative_time(Some("2024-03-10T11:59:00Z"), n), "1 minute ago");
        assert_eq!(relative_time(Some("2024-03-10T11:15:00Z"), n), "45 minutes ago");
        assert_eq!(relative_time(Some("2024-03-10T09:00:00Z"), n), "3 hours ago");
        assert_eq!(relative_time(Some("2024-03-09T12:00:00Z"), n), "1 day ago");
        assert_eq!(relative_time(Some("2024-03-04T12:00:00Z"), n), "6 days ago");
        assert_eq!(
            relative_time(Some("2024-03-01T17:00:00Z"), n),
            "01/03/2024 12:00:00 PM"
        );
    }

    #[test]
    fn test_relative_time_edge_values() {
        let n = now();
        assert_eq!(relative_time(None, n), "Never");
        assert_eq!(relative_time(Some("garbage"), n), "Invalid date");
        // Clock skew: a timestamp slightly in the future
        assert_eq!(relative_time(Some("2024-03-10T12:05:00Z"), n), "just now");
    }

    #[test]
    fn test_parse_date_only() {
        let dt = parse_timestamp("2024-03-05").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-03-05T00:00:00+00:00");
    }
}
