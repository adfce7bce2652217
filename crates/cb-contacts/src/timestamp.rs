use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::fmt;

/// Milliseconds since the unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EpochMillis(i64);

impl EpochMillis {
    /// Lowest timestamp [`try_parse_timestamp`] accepts; pre-epoch input is
    /// malformed. Also the stand-in for timestamps that cannot be parsed.
    pub const MIN_VALID: EpochMillis = EpochMillis(0);

    pub const fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for EpochMillis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

const POSTGRES_TEXT_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%d %H:%M:%S%.f%:z"];

/// Parses a stored timestamp: integer epoch millis first, then calendar forms.
/// Unparseable input maps to [`EpochMillis::MIN_VALID`].
pub fn parse_timestamp(raw: &str) -> EpochMillis {
    try_parse_timestamp(raw).unwrap_or_else(|| {
        tracing::warn!(raw = %raw, "unparseable timestamp, using epoch");
        EpochMillis::MIN_VALID
    })
}

pub fn try_parse_timestamp(raw: &str) -> Option<EpochMillis> {
    parse_any(raw.trim()).filter(|parsed| *parsed >= EpochMillis::MIN_VALID)
}

fn parse_any(raw: &str) -> Option<EpochMillis> {
    if raw.is_empty() {
        return None;
    }

    if let Ok(millis) = raw.parse::<i64>() {
        return Some(EpochMillis(millis));
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(EpochMillis(parsed.timestamp_millis()));
    }

    for format in POSTGRES_TEXT_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(raw, format) {
            return Some(EpochMillis(parsed.timestamp_millis()));
        }
    }

    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(EpochMillis(parsed.and_utc().timestamp_millis()));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| EpochMillis(midnight.and_utc().timestamp_millis()))
}
