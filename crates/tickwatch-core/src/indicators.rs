//! Trailing simple moving averages over daily closes.

use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::domain::PriceSeries;

/// Averaging windows tracked per ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum AveragePeriod {
    Ma10,
    Ma20,
}

impl AveragePeriod {
    pub const ALL: [Self; 2] = [Self::Ma10, Self::Ma20];

    /// Window length in trading days.
    pub const fn window(self) -> usize {
        match self {
            Self::Ma10 => 10,
            Self::Ma20 => 20,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Ma10 => "MA10",
            Self::Ma20 => "MA20",
        }
    }
}

impl Display for AveragePeriod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Average over the latest window and over the window ending one close earlier.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AveragePair {
    pub current: Option<f64>,
    pub prior: Option<f64>,
}

/// MA10 and MA20, each present only when the series is long enough.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MovingAverageSnapshot {
    pub ma10: AveragePair,
    pub ma20: AveragePair,
}

impl MovingAverageSnapshot {
    pub fn compute(series: &PriceSeries) -> Self {
        Self::from_closes(&series.closes())
    }

    /// `closes` must already be chronological and finite.
    pub fn from_closes(closes: &[f64]) -> Self {
        Self {
            ma10: pair(closes, AveragePeriod::Ma10.window()),
            ma20: pair(closes, AveragePeriod::Ma20.window()),
        }
    }

    pub const fn get(&self, period: AveragePeriod) -> AveragePair {
        match period {
            AveragePeriod::Ma10 => self.ma10,
            AveragePeriod::Ma20 => self.ma20,
        }
    }
}

fn pair(closes: &[f64], window: usize) -> AveragePair {
    let current = trailing_mean(closes, window);
    let prior = closes
        .split_last()
        .and_then(|(_, earlier)| trailing_mean(earlier, window));
    AveragePair { current, prior }
}

fn trailing_mean(closes: &[f64], window: usize) -> Option<f64> {
    if window == 0 || closes.len() < window {
        return None;
    }
    let tail = &closes[closes.len() - window..];
    let mean = tail.iter().sum::<f64>() / window as f64;
    mean.is_finite().then_some(mean)
}
