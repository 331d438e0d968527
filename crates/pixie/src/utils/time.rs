use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Current time as an RFC 3339 / ISO-8601 timestamp with millisecond
/// precision, e.g. `2024-05-01T12:00:00.000Z`.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Timestamp used for records whose creation time was never stored.
pub fn unknown_rfc3339() -> String {
    DateTime::<Utc>::UNIX_EPOCH.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Whether the string parses as an RFC 3339 timestamp.
pub fn is_rfc3339(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
}

/// Whether the string is an ISO-8601 date and time, either RFC 3339 or a
/// local time without offset such as `2023-11-02T08:15:00`.
pub fn is_iso8601(value: &str) -> bool {
    is_rfc3339(value) || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
}
