use std::fmt::{Display, Formatter};

use serde::{Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::macros::{format_description, offset};
use time::{Date, OffsetDateTime, UtcOffset};

/// Fixed exchange offset for Taiwan markets (no daylight saving).
pub const TAIPEI_OFFSET: UtcOffset = offset!(+8);

/// Instant in time held in UTC, with Taipei-local views for display and
/// trading-date bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtcDateTime(OffsetDateTime);

impl UtcDateTime {
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    pub fn from_unix_timestamp(seconds: i64) -> Option<Self> {
        OffsetDateTime::from_unix_timestamp(seconds).ok().map(Self)
    }

    pub fn from_offset_datetime(value: OffsetDateTime) -> Self {
        Self(value.to_offset(UtcOffset::UTC))
    }

    pub fn into_inner(self) -> OffsetDateTime {
        self.0
    }

    pub fn unix_timestamp(self) -> i64 {
        self.0.unix_timestamp()
    }

    pub fn to_taipei(self) -> OffsetDateTime {
        self.0.to_offset(TAIPEI_OFFSET)
    }

    /// Calendar date of this instant on the Taipei exchange clock.
    pub fn taipei_date(self) -> Date {
        self.to_taipei().date()
    }

    /// `YYYY-MM-DD HH:MM` on the Taipei clock, used in message headers.
    pub fn format_taipei_minute(self) -> String {
        let format = format_description!("[year]-[month]-[day] [hour]:[minute]");
        self.to_taipei()
            .format(&format)
            .unwrap_or_else(|_| self.format_rfc3339())
    }

    /// `YYYY-MM-DD HH:MM:SS` on the Taipei clock.
    pub fn format_taipei_second(self) -> String {
        let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
        self.to_taipei()
            .format(&format)
            .unwrap_or_else(|_| self.format_rfc3339())
    }

    pub fn format_rfc3339(self) -> String {
        self.0
            .format(&Rfc3339)
            .unwrap_or_else(|_| self.0.unix_timestamp().to_string())
    }
}

impl Display for UtcDateTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_rfc3339())
    }
}

impl Serialize for UtcDateTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_rfc3339())
    }
}
