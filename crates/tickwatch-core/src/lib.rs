//! # Tickwatch Core
//!
//! Moving-average signal detection for a watchlist of Taiwan-listed equities.
//!
//! ## Overview
//!
//! A run resolves each watchlist code to a market, pulls daily closes with
//! bounded retry, takes a fresh quote from the live venue feed (falling back to
//! history), computes MA10/MA20, classifies cross and touch events and
//! assembles length-capped messages for the push transport.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | TWSE MIS live quotes and Yahoo chart history |
//! | [`cache`] | Run-scoped resolution memo |
//! | [`config`] | Layered settings and validation |
//! | [`data_source`] | Feed traits and request/error types |
//! | [`domain`] | Tickers, markets, series, quotes, timestamps |
//! | [`error`] | Validation and configuration errors |
//! | [`history`] | History retriever with bounded retry |
//! | [`http_client`] | HTTP client abstraction |
//! | [`indicators`] | Moving-average engine |
//! | [`market_hours`] | Trading-hours gate |
//! | [`notify`] | LINE push transport |
//! | [`pipeline`] | Watchlist run orchestration |
//! | [`quote`] | Quote source adapter with fallback |
//! | [`report`] | Per-ticker lines and message chunking |
//! | [`resolver`] | Symbol resolver |
//! | [`retry`] | Shared retry policy |
//! | [`signal`] | Event classifier |
//! | [`source`] | Feed identifiers |
//! | [`throttling`] | Upstream request pacing |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tickwatch_core::{ReqwestHttpClient, RunOptions, SettingsLoader, UtcDateTime, WatchlistRunner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SettingsLoader::new().load()?.validate()?;
//!     let runner = WatchlistRunner::from_http(config, Arc::new(ReqwestHttpClient::new()));
//!
//!     let report = runner.run(UtcDateTime::now(), RunOptions::default()).await;
//!     for delivery in report.undelivered() {
//!         println!("{}", delivery.chunk.text());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Data absence is a value, not an error: an unresolvable code, an empty
//! history or an unusable quote turns into a "data unavailable" line for that
//! ticker. Only configuration problems surface as `Err`.

pub mod adapters;
pub mod cache;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod history;
pub mod http_client;
pub mod indicators;
pub mod market_hours;
pub mod notify;
pub mod pipeline;
pub mod quote;
pub mod report;
pub mod resolver;
pub mod retry;
pub mod signal;
pub mod source;
pub mod throttling;

// Adapter implementations
pub use adapters::{TwseQuoteFeed, YahooHistoryFeed};

// Caching
pub use cache::{Resolution, ResolutionCache};

// Configuration
pub use config::{LineCredentials, Settings, SettingsLoader, WatchConfig};

// Feed traits and types
pub use data_source::{HistoryFeed, HistoryRequest, QuoteFeed, SourceError, SourceErrorKind};

// Domain models
pub use domain::{
    ClosePoint, LiveQuote, Market, PriceQuote, PriceSeries, QuoteOrigin, ResolvedSymbol, Ticker,
    UtcDateTime,
};

// Error types
pub use error::{ConfigError, ValidationError};

// Pipeline stages
pub use history::HistoryRetriever;
pub use indicators::{AveragePair, AveragePeriod, MovingAverageSnapshot};
pub use market_hours::TradingWindow;
pub use quote::QuoteSourceAdapter;
pub use resolver::{ResolveError, SymbolResolver};
pub use signal::{classify, Event, EventKind, SignalMode};

// Reporting and delivery
pub use notify::{LineNotifier, NotifyError, Notifier};
pub use pipeline::{
    ChunkKind, Delivery, DeliveryStatus, RunOptions, RunReport, RunStatus, WatchlistRunner,
};
pub use report::{MessageChunk, ReportAssembler, TickerOutcome, TickerReport, UnavailableReason};

// HTTP client types
pub use http_client::{
    BearerToken, HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient,
};

// Retry logic
pub use retry::{Backoff, RetryConfig};

// Source identifiers
pub use source::FeedId;

// Throttling
pub use throttling::RequestPacer;
