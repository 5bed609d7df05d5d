//! Shared fakes for the integration suites.
//!
//! Feeds are keyed by the fully-qualified history symbol (`2330.TW`) or the
//! bare code for live quotes, and count every call so tests can assert how
//! often an upstream was hit.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use time::macros::{date, datetime};
use time::Duration as TimeDuration;

use tickwatch_core::data_source::FeedFuture;
use tickwatch_core::http_client::HttpFuture;
use tickwatch_core::notify::NotifyFuture;
use tickwatch_core::{
    FeedId, HistoryFeed, HistoryRequest, HttpClient, HttpError, HttpRequest, HttpResponse,
    LiveQuote, NotifyError, Notifier, PriceSeries, QuoteFeed, ResolvedSymbol, Settings,
    SourceError, UtcDateTime, WatchConfig,
};

/// Wednesday 2024-01-03 10:00 in Taipei.
pub fn trading_morning() -> UtcDateTime {
    UtcDateTime::from_offset_datetime(datetime!(2024-01-03 02:00 UTC))
}

/// Wednesday 2024-01-03 14:30 in Taipei, after the close.
pub fn after_close() -> UtcDateTime {
    UtcDateTime::from_offset_datetime(datetime!(2024-01-03 06:30 UTC))
}

/// Settings with retry delays and pacing removed so suites run instantly.
pub fn fast_settings(codes: &[&str]) -> Settings {
    let mut settings = Settings::default();
    settings.watchlist = codes.iter().map(|code| (*code).to_owned()).collect();
    settings.history.retry_delay_ms = 0;
    settings.feeds.request_spacing_ms = 0;
    settings
}

pub fn fast_config(codes: &[&str]) -> WatchConfig {
    fast_settings(codes)
        .validate()
        .expect("test settings should validate")
}

/// Closes on consecutive calendar days from 2024-01-01.
pub fn series(symbol: &ResolvedSymbol, closes: &[f64]) -> PriceSeries {
    let start = date!(2024 - 01 - 01);
    PriceSeries::new(
        symbol.clone(),
        closes
            .iter()
            .enumerate()
            .map(|(offset, close)| (start + TimeDuration::days(offset as i64), Some(*close))),
    )
}

/// Nine closes at 100, eleven at 90, then 105: MA20 goes 94.50 to 94.75.
pub fn cross_up_closes() -> Vec<f64> {
    let mut closes = vec![100.0; 9];
    closes.extend(std::iter::repeat(90.0).take(11));
    closes.push(105.0);
    closes
}

pub fn flat_closes(value: f64, count: usize) -> Vec<f64> {
    vec![value; count]
}

#[derive(Clone)]
enum HistoryScript {
    Closes(Vec<f64>),
    Fail(SourceError),
}

/// History feed answering from a fixed table. Unknown symbols get an empty series.
#[derive(Default)]
pub struct FakeHistoryFeed {
    scripts: Mutex<HashMap<String, HistoryScript>>,
    outages: Mutex<HashMap<String, usize>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl FakeHistoryFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_closes(self, yahoo_symbol: &str, closes: Vec<f64>) -> Self {
        self.lock_scripts()
            .insert(yahoo_symbol.to_owned(), HistoryScript::Closes(closes));
        self
    }

    pub fn with_error(self, yahoo_symbol: &str, error: SourceError) -> Self {
        self.lock_scripts()
            .insert(yahoo_symbol.to_owned(), HistoryScript::Fail(error));
        self
    }

    /// The first `failures` calls for `yahoo_symbol` time out before the
    /// scripted answer is served.
    pub fn with_transient_failures(self, yahoo_symbol: &str, failures: usize) -> Self {
        self.outages
            .lock()
            .expect("outages lock")
            .insert(yahoo_symbol.to_owned(), failures);
        self
    }

    pub fn calls(&self, yahoo_symbol: &str) -> usize {
        self.calls
            .lock()
            .expect("calls lock")
            .get(yahoo_symbol)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().expect("calls lock").values().sum()
    }

    fn lock_scripts(&self) -> std::sync::MutexGuard<'_, HashMap<String, HistoryScript>> {
        self.scripts.lock().expect("scripts lock")
    }
}

impl HistoryFeed for FakeHistoryFeed {
    fn id(&self) -> FeedId {
        FeedId::Yahoo
    }

    fn daily_closes<'a>(&'a self, req: &'a HistoryRequest) -> FeedFuture<'a, PriceSeries> {
        Box::pin(async move {
            let key = req.symbol.yahoo_symbol();
            *self
                .calls
                .lock()
                .expect("calls lock")
                .entry(key.clone())
                .or_insert(0) += 1;

            if let Some(remaining) = self.outages.lock().expect("outages lock").get_mut(&key) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(SourceError::unavailable("timeout"));
                }
            }

            let script = self.lock_scripts().get(&key).cloned();
            match script {
                Some(HistoryScript::Closes(closes)) => Ok(series(&req.symbol, &closes)),
                Some(HistoryScript::Fail(error)) => Err(error),
                None => Ok(PriceSeries::empty(req.symbol.clone())),
            }
        })
    }
}

/// Live quote feed keyed by bare code, or one that always fails.
#[derive(Default)]
pub struct FakeQuoteFeed {
    quotes: HashMap<String, LiveQuote>,
    failure: Option<SourceError>,
    calls: Mutex<usize>,
}

impl FakeQuoteFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: SourceError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn with_quote(mut self, code: &str, name: &str, last: Option<f64>, prev: Option<f64>) -> Self {
        self.quotes.insert(
            code.to_owned(),
            LiveQuote {
                code: code.to_owned(),
                name: Some(name.to_owned()),
                last,
                prev_close: prev,
            },
        );
        self
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().expect("calls lock")
    }
}

impl QuoteFeed for FakeQuoteFeed {
    fn id(&self) -> FeedId {
        FeedId::Twse
    }

    fn quotes<'a>(&'a self, symbols: &'a [ResolvedSymbol]) -> FeedFuture<'a, Vec<LiveQuote>> {
        Box::pin(async move {
            *self.calls.lock().expect("calls lock") += 1;
            if let Some(error) = &self.failure {
                return Err(error.clone());
            }
            Ok(symbols
                .iter()
                .filter_map(|symbol| self.quotes.get(&symbol.code).cloned())
                .collect())
        })
    }
}

/// Records every text it is asked to send. Sends after `fail_after`
/// successes are recorded and then rejected.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<String>>,
    fail_after: Option<usize>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self::failing_after(0)
    }

    pub fn failing_after(successes: usize) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_after: Some(successes),
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().expect("sent lock").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn send<'a>(&'a self, text: &'a str) -> NotifyFuture<'a> {
        Box::pin(async move {
            let mut sent = self.sent.lock().expect("sent lock");
            let attempt = sent.len();
            sent.push(text.to_owned());
            match self.fail_after {
                Some(successes) if attempt >= successes => Err(NotifyError::Rejected {
                    status: 500,
                    body: String::from("simulated outage"),
                }),
                _ => Ok(()),
            }
        })
    }
}

/// HTTP double replaying scripted responses; the last one repeats.
pub struct ScriptedHttpClient {
    responses: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    pub fn new(responses: Vec<Result<HttpResponse, HttpError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        Box::pin(async move {
            self.requests.lock().expect("requests lock").push(request);
            let mut responses = self.responses.lock().expect("responses lock");
            if responses.len() > 1 {
                responses.pop_front().unwrap_or_else(|| Ok(HttpResponse::ok("{}")))
            } else {
                responses
                    .front()
                    .cloned()
                    .unwrap_or_else(|| Ok(HttpResponse::ok("{}")))
            }
        })
    }
}
