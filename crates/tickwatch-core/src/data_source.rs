//! Feed traits and request/error types.
//!
//! Two upstream contracts feed the pipeline:
//!
//! | Trait | Request | Response | Description |
//! |-------|---------|----------|-------------|
//! | [`QuoteFeed`] | `&[ResolvedSymbol]` | `Vec<LiveQuote>` | Live last trade and previous close |
//! | [`HistoryFeed`] | [`HistoryRequest`] | [`PriceSeries`] | Daily closes over a lookback window |
//!
//! Both return boxed futures so implementations can be held behind `Arc<dyn _>`
//! and swapped for in-memory fakes in tests.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::domain::{LiveQuote, PriceSeries, ResolvedSymbol};
use crate::http_client::HttpError;
use crate::FeedId;

/// Coarse classification the retry and fallback paths branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceErrorKind {
    Unavailable,
    RateLimited,
    InvalidRequest,
    NotFound,
    /// The feed answered with something that could not be understood.
    Protocol,
}

impl SourceErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unavailable => "unavailable",
            Self::RateLimited => "rate_limited",
            Self::InvalidRequest => "invalid_request",
            Self::NotFound => "not_found",
            Self::Protocol => "protocol",
        }
    }
}

/// Failure reported by a quote or history feed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("feed unavailable: {0}")]
    Unavailable(String),
    #[error("feed rate limited: {0}")]
    RateLimited(String),
    #[error("invalid feed request: {0}")]
    InvalidRequest(String),
    #[error("no data: {0}")]
    NotFound(String),
    #[error("unusable feed response: {0}")]
    Protocol(String),
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::RateLimited(message.into())
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// A transport failure from `feed`. Requests that could not even be
    /// built are protocol errors; everything else is worth another try.
    pub fn from_transport(feed: FeedId, error: &HttpError) -> Self {
        let message = format!("{feed}: {error}");
        if error.retryable() {
            Self::Unavailable(message)
        } else {
            Self::Protocol(message)
        }
    }

    /// A non-success HTTP status from `feed`.
    pub fn from_status(feed: FeedId, status: u16) -> Self {
        let message = format!("{feed} answered HTTP {status}");
        match status {
            404 => Self::NotFound(message),
            429 => Self::RateLimited(message),
            408 | 500..=599 => Self::Unavailable(message),
            _ => Self::InvalidRequest(message),
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        match self {
            Self::Unavailable(_) => SourceErrorKind::Unavailable,
            Self::RateLimited(_) => SourceErrorKind::RateLimited,
            Self::InvalidRequest(_) => SourceErrorKind::InvalidRequest,
            Self::NotFound(_) => SourceErrorKind::NotFound,
            Self::Protocol(_) => SourceErrorKind::Protocol,
        }
    }

    pub const fn retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::RateLimited(_))
    }
}

/// Request payload for daily history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub symbol: ResolvedSymbol,
    /// Calendar days back from now.
    pub lookback_days: u32,
}

impl HistoryRequest {
    pub fn new(symbol: ResolvedSymbol, lookback_days: u32) -> Result<Self, SourceError> {
        if lookback_days == 0 {
            return Err(SourceError::invalid_request("lookback must be at least one day"));
        }
        Ok(Self {
            symbol,
            lookback_days,
        })
    }
}

pub type FeedFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Live quote feed contract.
///
/// Implementations return one entry per symbol they recognise; unknown
/// symbols are simply absent from the result.
pub trait QuoteFeed: Send + Sync {
    fn id(&self) -> FeedId;

    fn quotes<'a>(&'a self, symbols: &'a [ResolvedSymbol]) -> FeedFuture<'a, Vec<LiveQuote>>;
}

/// Daily close history contract.
///
/// An unknown symbol is either an empty series or a
/// [`SourceErrorKind::NotFound`] error; callers treat both as "no data".
pub trait HistoryFeed: Send + Sync {
    fn id(&self) -> FeedId;

    fn daily_closes<'a>(&'a self, req: &'a HistoryRequest) -> FeedFuture<'a, PriceSeries>;
}
