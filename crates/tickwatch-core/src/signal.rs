//! Crossover and touch classification against moving averages.
//!
//! Each average is judged on its own. A cross needs price, previous close and
//! both the current and prior average; a touch needs price and the current
//! average. A cross on an average suppresses a touch on the same average.
//! Events come out MA20 first.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::indicators::{AveragePair, AveragePeriod, MovingAverageSnapshot};
use crate::ValidationError;

pub const DEFAULT_TOUCH_TOLERANCE: f64 = 0.005;

/// Absorbs float rounding when price sits exactly on the tolerance edge.
const TOUCH_SLACK_ULPS: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Touch,
    CrossUp,
    CrossDown,
}

impl EventKind {
    pub const fn is_cross(self) -> bool {
        matches!(self, Self::CrossUp | Self::CrossDown)
    }
}

/// One detected condition on one average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Event {
    pub period: AveragePeriod,
    pub kind: EventKind,
}

impl Event {
    pub const fn new(period: AveragePeriod, kind: EventKind) -> Self {
        Self { period, kind }
    }

    /// Lower is more important: MA20 before MA10, cross before touch.
    const fn priority(self) -> u8 {
        let period = match self.period {
            AveragePeriod::Ma20 => 0,
            AveragePeriod::Ma10 => 2,
        };
        let kind = if self.kind.is_cross() { 0 } else { 1 };
        period + kind
    }
}

impl Display for Event {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            EventKind::Touch => "touch",
            EventKind::CrossUp => "cross_up",
            EventKind::CrossDown => "cross_down",
        };
        write!(f, "{kind}_{}", self.period.label().to_ascii_lowercase())
    }
}

/// How many events a ticker may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalMode {
    /// Every average reports its own event.
    #[default]
    Independent,
    /// Only the single most important event is kept.
    Exclusive,
}

impl FromStr for SignalMode {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "independent" => Ok(Self::Independent),
            "exclusive" => Ok(Self::Exclusive),
            other => Err(ValidationError::InvalidSignalMode {
                value: other.to_owned(),
            }),
        }
    }
}

/// Side of an average the price sits on, for status lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Above,
    Below,
    At,
}

impl Position {
    pub fn of(price: f64, average: f64) -> Option<Self> {
        if !price.is_finite() || !average.is_finite() {
            return None;
        }
        Some(if price > average {
            Self::Above
        } else if price < average {
            Self::Below
        } else {
            Self::At
        })
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Above => "above",
            Self::Below => "below",
            Self::At => "at",
        }
    }
}

/// Classifies `price` against `snapshot`.
///
/// Missing or non-finite inputs never produce an event.
pub fn classify(
    price: Option<f64>,
    prev_close: Option<f64>,
    snapshot: &MovingAverageSnapshot,
    touch_tolerance: f64,
    mode: SignalMode,
) -> Vec<Event> {
    let price = price.filter(|value| value.is_finite());
    let prev_close = prev_close.filter(|value| value.is_finite());

    let mut events: Vec<Event> = [AveragePeriod::Ma20, AveragePeriod::Ma10]
        .into_iter()
        .filter_map(|period| {
            classify_average(price, prev_close, snapshot.get(period), touch_tolerance)
                .map(|kind| Event::new(period, kind))
        })
        .collect();

    if mode == SignalMode::Exclusive {
        events.sort_by_key(|event| event.priority());
        events.truncate(1);
    }
    events
}

fn classify_average(
    price: Option<f64>,
    prev_close: Option<f64>,
    average: AveragePair,
    touch_tolerance: f64,
) -> Option<EventKind> {
    let price = price?;
    let current = average.current.filter(|value| value.is_finite())?;

    if let (Some(prev_close), Some(prior)) = (prev_close, average.prior.filter(|v| v.is_finite())) {
        if prev_close < prior && price > current {
            return Some(EventKind::CrossUp);
        }
        if prev_close > prior && price < current {
            return Some(EventKind::CrossDown);
        }
    }

    is_touch(price, current, touch_tolerance).then_some(EventKind::Touch)
}

/// `|price - average| / average <= tolerance`, for a positive average.
pub fn is_touch(price: f64, average: f64, touch_tolerance: f64) -> bool {
    if !(price.is_finite() && average.is_finite() && touch_tolerance.is_finite()) {
        return false;
    }
    if average <= 0.0 || touch_tolerance < 0.0 {
        return false;
    }
    let band = average * touch_tolerance;
    let slack = average * f64::EPSILON * TOUCH_SLACK_ULPS;
    (price - average).abs() <= band + slack
}
