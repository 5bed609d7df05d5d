//! # Domain Models
//!
//! Canonical domain types for watchlist signal detection.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Ticker`] | Watchlist entry: bare code plus optional market hint |
//! | [`Market`] | Listing venue (main board or OTC) |
//! | [`ResolvedSymbol`] | Code joined with the venue that has history |
//! | [`PriceSeries`] | Ascending, finite daily closes |
//! | [`PriceQuote`] | Current price and previous close for display |
//! | [`UtcDateTime`] | UTC instant with Taipei-clock views |
//!
//! Construction validates invariants; a [`PriceSeries`] never holds a
//! missing or non-finite close.

mod series;
mod symbol;
mod timestamp;

pub use series::{ClosePoint, LiveQuote, PriceQuote, PriceSeries, QuoteOrigin};
pub use symbol::{Market, ResolvedSymbol, Ticker};
pub use timestamp::{UtcDateTime, TAIPEI_OFFSET};
