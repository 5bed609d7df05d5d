//! One batch run over the watchlist.
//!
//! Tickers are evaluated with bounded concurrency; results keep watchlist
//! order. Per-ticker failures become [`TickerOutcome::Unavailable`] and push
//! failures become undelivered chunks. Nothing here returns an error.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use futures::FutureExt;
use serde::Serialize;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::adapters::{TwseQuoteFeed, YahooHistoryFeed};
use crate::config::WatchConfig;
use crate::data_source::{HistoryFeed, QuoteFeed};
use crate::domain::{Ticker, UtcDateTime};
use crate::history::HistoryRetriever;
use crate::http_client::HttpClient;
use crate::indicators::MovingAverageSnapshot;
use crate::notify::{LineNotifier, Notifier};
use crate::quote::QuoteSourceAdapter;
use crate::report::{MessageChunk, TickerOutcome, TickerReport, UnavailableReason};
use crate::resolver::{ResolveError, SymbolResolver};
use crate::signal::classify;
use crate::throttling::RequestPacer;

/// Which message a chunk belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    Summary,
    Alerts,
    Test,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryStatus {
    Sent,
    /// No transport configured, or a dry run.
    PrintOnly,
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub kind: ChunkKind,
    pub chunk: MessageChunk,
    pub status: DeliveryStatus,
}

impl Delivery {
    pub fn delivered(&self) -> bool {
        self.status == DeliveryStatus::Sent
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    OutsideTradingHours,
}

/// Everything one run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub generated_at: UtcDateTime,
    pub status: RunStatus,
    pub outcomes: Vec<TickerOutcome>,
    pub deliveries: Vec<Delivery>,
}

impl RunReport {
    /// Chunks the caller must print because they did not reach the channel.
    pub fn undelivered(&self) -> impl Iterator<Item = &Delivery> {
        self.deliveries.iter().filter(|delivery| !delivery.delivered())
    }

    pub fn alert_count(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.is_alert()).count()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Bypass the trading-hours gate for this run.
    pub ignore_hours: bool,
}

/// Drives resolution, history, quotes, classification and delivery.
pub struct WatchlistRunner {
    config: WatchConfig,
    resolver: SymbolResolver,
    history: Arc<HistoryRetriever>,
    quotes: QuoteSourceAdapter,
    notifier: Option<Arc<dyn Notifier>>,
}

impl WatchlistRunner {
    pub fn new(
        config: WatchConfig,
        quote_feed: Arc<dyn QuoteFeed>,
        history_feed: Arc<dyn HistoryFeed>,
    ) -> Self {
        let history = Arc::new(HistoryRetriever::new(
            Arc::clone(&history_feed),
            config.history_retry.clone(),
            config.lookback_days,
        ));
        Self {
            resolver: SymbolResolver::new(
                history_feed,
                config.probe_days,
                config.history_retry.clone(),
            ),
            quotes: QuoteSourceAdapter::new(quote_feed, Arc::clone(&history), config.probe_days),
            history,
            notifier: None,
            config,
        }
    }

    /// Production wiring: TWSE live quotes, Yahoo history and, when
    /// credentials are configured, LINE push, all over one HTTP client.
    pub fn from_http(config: WatchConfig, http_client: Arc<dyn HttpClient>) -> Self {
        let pacer = RequestPacer::new(config.request_spacing);
        let timeout_ms = config.request_timeout_ms;
        let quote_feed = Arc::new(TwseQuoteFeed::new(
            Arc::clone(&http_client),
            pacer.clone(),
            timeout_ms,
        ));
        let history_feed = Arc::new(YahooHistoryFeed::new(
            Arc::clone(&http_client),
            pacer,
            timeout_ms,
        ));
        let notifier = config.line.as_ref().map(|credentials| {
            Arc::new(
                LineNotifier::new(
                    http_client,
                    credentials.channel_token.clone(),
                    credentials.target_id.clone(),
                )
                .with_timeout_ms(timeout_ms),
            ) as Arc<dyn Notifier>
        });

        let runner = Self::new(config, quote_feed, history_feed);
        match notifier {
            Some(notifier) => runner.with_notifier(notifier),
            None => runner,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Drops any transport so every chunk is returned for printing.
    pub fn print_only(mut self) -> Self {
        self.notifier = None;
        self
    }

    pub fn has_notifier(&self) -> bool {
        self.notifier.is_some()
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    pub async fn run(&self, now: UtcDateTime, options: RunOptions) -> RunReport {
        let run_id = Uuid::new_v4();
        let span = info_span!("run", %run_id);
        self.run_inner(run_id, now, options).instrument(span).await
    }

    async fn run_inner(&self, run_id: Uuid, now: UtcDateTime, options: RunOptions) -> RunReport {
        if let Some(window) = self.config.trading_window.filter(|_| !options.ignore_hours) {
            if !window.contains(now) {
                info!(at = %now.format_taipei_second(), "outside trading window, nothing to do");
                return RunReport {
                    run_id,
                    generated_at: now,
                    status: RunStatus::OutsideTradingHours,
                    outcomes: Vec::new(),
                    deliveries: Vec::new(),
                };
            }
        }

        info!(tickers = self.config.tickers.len(), "run started");
        let outcomes = self.evaluate_all().await;

        let mut chunks: Vec<(ChunkKind, MessageChunk)> = self
            .config
            .assembler
            .assemble(&outcomes, now)
            .into_iter()
            .map(|chunk| (ChunkKind::Summary, chunk))
            .collect();
        if self.config.alert_digest {
            chunks.extend(
                self.config
                    .assembler
                    .alert_digest(&outcomes, now)
                    .into_iter()
                    .map(|chunk| (ChunkKind::Alerts, chunk)),
            );
        }

        let mut deliveries = Vec::with_capacity(chunks.len());
        for (kind, chunk) in chunks {
            deliveries.push(self.deliver(kind, chunk).await);
        }

        let report = RunReport {
            run_id,
            generated_at: now,
            status: RunStatus::Completed,
            outcomes,
            deliveries,
        };
        info!(
            alerts = report.alert_count(),
            chunks = report.deliveries.len(),
            undelivered = report.undelivered().count(),
            "run finished"
        );
        report
    }

    /// Sends one timestamped message to check the transport.
    pub async fn test_push(&self, now: UtcDateTime) -> Delivery {
        let chunk = MessageChunk {
            header: String::from("✅ tickwatch push test"),
            lines: vec![now.format_taipei_second() + " (Taipei)"],
        };
        self.deliver(ChunkKind::Test, chunk).await
    }

    /// All tickers, in watchlist order.
    pub async fn evaluate_all(&self) -> Vec<TickerOutcome> {
        let concurrency = self.config.concurrency.max(1);
        let outcomes: futures::future::BoxFuture<'_, Vec<TickerOutcome>> =
            stream::iter(self.config.tickers.iter())
                .map(|ticker| self.evaluate(ticker))
                .buffered(concurrency)
                .collect::<Vec<_>>()
                .boxed();
        outcomes.await
    }

    pub async fn evaluate(&self, ticker: &Ticker) -> TickerOutcome {
        let span = info_span!("ticker", code = ticker.code());
        self.evaluate_inner(ticker).instrument(span).await
    }

    async fn evaluate_inner(&self, ticker: &Ticker) -> TickerOutcome {
        let symbol = match self.resolver.resolve(ticker).await {
            Ok(symbol) => symbol,
            Err(ResolveError::NotFound { code }) => {
                warn!("symbol not found on any market");
                return TickerOutcome::unavailable(code, UnavailableReason::SymbolNotFound);
            }
            Err(ResolveError::Unreachable { code, source }) => {
                warn!(error = %source, "symbol resolution unreachable");
                return TickerOutcome::unavailable(code, UnavailableReason::FeedUnreachable);
            }
        };

        let series = self.history.fetch(&symbol).await;
        let Some(quote) = self.quotes.current_and_prev_with(&symbol, Some(&series)).await else {
            return TickerOutcome::unavailable(symbol.code, UnavailableReason::NoQuote);
        };

        let snapshot = MovingAverageSnapshot::compute(&series);
        let events = classify(
            Some(quote.price),
            Some(quote.prev_close),
            &snapshot,
            self.config.touch_tolerance,
            self.config.signal_mode,
        );
        if !events.is_empty() {
            let names: Vec<String> = events.iter().map(ToString::to_string).collect();
            info!(symbol = %symbol, events = ?names, "signal detected");
        }

        TickerOutcome::Evaluated(TickerReport {
            symbol,
            quote,
            snapshot,
            events,
        })
    }

    async fn deliver(&self, kind: ChunkKind, chunk: MessageChunk) -> Delivery {
        let Some(notifier) = &self.notifier else {
            return Delivery {
                kind,
                chunk,
                status: DeliveryStatus::PrintOnly,
            };
        };

        let text = chunk.text();
        let status = match notifier.send(&text).await {
            Ok(()) => {
                info!(transport = notifier.name(), chars = chunk.char_len(), "chunk delivered");
                DeliveryStatus::Sent
            }
            Err(err) => {
                warn!(transport = notifier.name(), error = %err, "chunk undelivered");
                DeliveryStatus::Failed {
                    error: err.to_string(),
                }
            }
        };
        Delivery {
            kind,
            chunk,
            status,
        }
    }
}
