//! Timestamp helpers
//!
//! Rows store UTC epoch milliseconds; the wire format is ISO-8601 with
//! millisecond precision and a `Z` suffix.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

/// Current time as UTC epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Current time formatted for the wire
pub fn now_iso() -> String {
    format_iso(Utc::now())
}

/// Format a UTC instant as `YYYY-MM-DDTHH:MM:SS.mmmZ`
pub fn format_iso(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Format epoch milliseconds for the wire
///
/// Out-of-range values fall back to the Unix epoch.
pub fn millis_to_iso(millis: i64) -> String {
    let at = Utc
        .timestamp_millis_opt(millis)
        .single()
        .unwrap_or_default();
    format_iso(at)
}

/// Parse an ISO-8601 date or date-time into epoch milliseconds
///
/// Accepts RFC 3339 date-times (`2024-05-01T10:00:00Z`) and bare dates
/// (`2024-05-01`, read as midnight UTC).
pub fn parse_iso_millis(input: &str) -> Option<i64> {
    if let Ok(at) = DateTime::parse_from_rfc3339(input) {
        return Some(at.with_timezone(&Utc).timestamp_millis());
    }
    chrono::NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt).timestamp_millis())
}

/// Serde adapter for epoch-millisecond fields rendered as ISO strings
pub mod iso_millis {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(millis: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::millis_to_iso(*millis))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_iso_millis(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
    }
}

/// Serde adapter for optional epoch-millisecond fields
pub mod iso_millis_opt {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        millis: &Option<i64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match millis {
            Some(m) => serializer.serialize_str(&super::millis_to_iso(*m)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<i64>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw {
            Some(s) => super::parse_iso_millis(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", s))),
            None => Ok(None),
        }
    }
}
