use chrono::{DateTime, SecondsFormat, Utc};

/// Jira v2 renders offsets without a colon (`+0200`), which Clubhouse rejects.
/// Anything unparseable is passed through untouched.
pub fn normalize_timestamp(raw: &str) -> String {
    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|ts| {
            ts.with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true)
        })
        .unwrap_or_else(|_| raw.to_string())
}
