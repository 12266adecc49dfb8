//! Timestamp normalization helpers for values reported by the sync backend.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Normalize a `lastSyncTime` wire value into a UTC timestamp.
///
/// Accepts:
/// - RFC3339 string -> as-is, converted to UTC
/// - Naive datetime string `YYYY-MM-DDTHH:MM:SS` -> interpreted as UTC
/// - Integer or float -> epoch milliseconds
pub fn parse_sync_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::String(s) => parse_timestamp_str(s),
        serde_json::Value::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            Utc.timestamp_millis_opt(millis).single()
        }
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(Utc.from_utc_datetime(&ndt));
    }
    None
}

/// Format a sync timestamp the way the dashboard shows it.
pub fn format_sync_time(t: &DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_rfc3339_with_offset() {
        let t = parse_sync_timestamp(&json!("2025-03-01T10:30:00+02:00")).unwrap();
        assert_eq!(format_sync_time(&t), "2025-03-01 08:30:00 UTC");
    }

    #[test]
    fn parses_naive_datetime_as_utc() {
        let t = parse_sync_timestamp(&json!("2025-03-01T08:30:00")).unwrap();
        assert_eq!(format_sync_time(&t), "2025-03-01 08:30:00 UTC");
    }

    #[test]
    fn parses_epoch_millis() {
        let t = parse_sync_timestamp(&json!(0)).unwrap();
        assert_eq!(format_sync_time(&t), "1970-01-01 00:00:00 UTC");
    }

    #[test]
    fn rejects_invalid() {
        assert!(parse_sync_timestamp(&json!("not-a-date")).is_none());
        assert!(parse_sync_timestamp(&json!(true)).is_none());
    }
}
