use time::macros::{format_description, time};
use time::{Time, Weekday};

use crate::domain::UtcDateTime;
use crate::ValidationError;

pub const DEFAULT_OPEN: Time = time!(9:00);
pub const DEFAULT_CLOSE: Time = time!(13:30);

/// Weekday session on the Taipei clock, both ends inclusive.
///
/// Exchange holidays are not modelled; a run on a holiday proceeds and
/// reports whatever the feeds return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradingWindow {
    open: Time,
    close: Time,
}

impl Default for TradingWindow {
    fn default() -> Self {
        Self {
            open: DEFAULT_OPEN,
            close: DEFAULT_CLOSE,
        }
    }
}

impl TradingWindow {
    pub fn new(open: Time, close: Time) -> Result<Self, ValidationError> {
        if open >= close {
            return Err(ValidationError::EmptyTradingWindow {
                open: format_hhmm(open),
                close: format_hhmm(close),
            });
        }
        Ok(Self { open, close })
    }

    /// Parses `HH:MM` bounds.
    pub fn parse(open: &str, close: &str) -> Result<Self, ValidationError> {
        Self::new(parse_time_of_day(open)?, parse_time_of_day(close)?)
    }

    pub const fn open(&self) -> Time {
        self.open
    }

    pub const fn close(&self) -> Time {
        self.close
    }

    pub fn contains(&self, instant: UtcDateTime) -> bool {
        let local = instant.to_taipei();
        let weekday = local.weekday();
        if matches!(weekday, Weekday::Saturday | Weekday::Sunday) {
            return false;
        }
        let now = local.time();
        now >= self.open && now <= self.close
    }
}

pub fn parse_time_of_day(value: &str) -> Result<Time, ValidationError> {
    let format = format_description!("[hour]:[minute]");
    Time::parse(value.trim(), &format).map_err(|_| ValidationError::InvalidTimeOfDay {
        value: value.to_owned(),
    })
}

fn format_hhmm(value: Time) -> String {
    format!("{:02}:{:02}", value.hour(), value.minute())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn at(value: time::OffsetDateTime) -> UtcDateTime {
        UtcDateTime::from_offset_datetime(value)
    }

    #[test]
    fn weekday_session_is_inclusive() {
        let window = TradingWindow::default();
        // Monday 2024-03-04.
        assert!(window.contains(at(datetime!(2024-03-04 09:00 +8))));
        assert!(window.contains(at(datetime!(2024-03-04 13:30 +8))));
        assert!(!window.contains(at(datetime!(2024-03-04 08:59 +8))));
        assert!(!window.contains(at(datetime!(2024-03-04 13:31 +8))));
    }

    #[test]
    fn weekends_are_closed() {
        let window = TradingWindow::default();
        assert!(!window.contains(at(datetime!(2024-03-09 10:00 +8))));
        assert!(!window.contains(at(datetime!(2024-03-10 10:00 +8))));
    }

    #[test]
    fn uses_taipei_clock_not_utc() {
        let window = TradingWindow::default();
        // 02:00 UTC is 10:00 in Taipei.
        assert!(window.contains(at(datetime!(2024-03-04 02:00 UTC))));
    }

    #[test]
    fn rejects_malformed_and_empty_windows() {
        assert!(matches!(
            TradingWindow::parse("9am", "13:30"),
            Err(ValidationError::InvalidTimeOfDay { .. })
        ));
        assert!(matches!(
            TradingWindow::parse("13:30", "09:00"),
            Err(ValidationError::EmptyTradingWindow { .. })
        ));
    }
}
