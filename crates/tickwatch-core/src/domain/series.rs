use serde::Serialize;
use time::Date;

use crate::domain::symbol::ResolvedSymbol;
use crate::ValidationError;

/// One daily closing price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClosePoint {
    pub date: Date,
    pub close: f64,
}

impl ClosePoint {
    pub fn new(date: Date, close: f64) -> Result<Self, ValidationError> {
        if !close.is_finite() {
            return Err(ValidationError::NonFiniteValue { field: "close" });
        }
        Ok(Self { date, close })
    }
}

/// Chronologically ascending daily closes for one resolved symbol.
///
/// Construction drops non-finite closes, sorts by trading date and keeps the
/// last point seen for a date, so callers can feed raw upstream rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    pub symbol: ResolvedSymbol,
    points: Vec<ClosePoint>,
}

impl PriceSeries {
    pub fn new<I>(symbol: ResolvedSymbol, rows: I) -> Self
    where
        I: IntoIterator<Item = (Date, Option<f64>)>,
    {
        let mut points: Vec<ClosePoint> = rows
            .into_iter()
            .filter_map(|(date, close)| ClosePoint::new(date, close?).ok())
            .collect();

        // Stable sort keeps upstream order within a date; the later row wins.
        points.sort_by_key(|point| point.date);
        let mut deduped: Vec<ClosePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }

        Self {
            symbol,
            points: deduped,
        }
    }

    pub fn empty(symbol: ResolvedSymbol) -> Self {
        Self {
            symbol,
            points: Vec::new(),
        }
    }

    pub fn points(&self) -> &[ClosePoint] {
        &self.points
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|point| point.close).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Latest and second-latest close, when at least two are present.
    pub fn last_two(&self) -> Option<(f64, f64)> {
        match self.points.as_slice() {
            [.., prev, last] => Some((last.close, prev.close)),
            _ => None,
        }
    }
}

/// Where a [`PriceQuote`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteOrigin {
    /// Primary live venue feed.
    Live,
    /// Latest two closes of the history feed.
    HistoryFallback,
}

/// Current price and previous close for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceQuote {
    pub name: Option<String>,
    pub price: f64,
    pub prev_close: f64,
    pub origin: QuoteOrigin,
}

impl PriceQuote {
    /// Day-over-day change in percent, absent when the previous close is zero.
    pub fn change_pct(&self) -> Option<f64> {
        if self.prev_close == 0.0 {
            return None;
        }
        let pct = (self.price - self.prev_close) / self.prev_close * 100.0;
        pct.is_finite().then_some(pct)
    }
}

/// Raw entry from the live venue feed, before sentinel filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveQuote {
    pub code: String,
    pub name: Option<String>,
    pub last: Option<f64>,
    pub prev_close: Option<f64>,
}
