use chrono::{DateTime, Months, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// UTC instant. Provider timestamps arrive as Unix seconds; the profile
/// store receives RFC 3339 strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// `None` when `secs` is outside chrono's representable range.
    pub fn from_unix_secs(secs: i64) -> Option<Self> {
        Utc.timestamp_opt(secs, 0).single().map(Self)
    }

    /// Calendar-month arithmetic; the day clamps to the end of a shorter
    /// month, so Jan 31 + 1 lands on the last day of February.
    pub fn add_months(&self, months: u32) -> Self {
        match self.0.checked_add_months(Months::new(months)) {
            Some(shifted) => Self(shifted),
            None => *self,
        }
    }

    pub fn to_date_string(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }

    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }
}
