use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::data_source::{FeedFuture, HistoryFeed, HistoryRequest, SourceError};
use crate::domain::{PriceSeries, UtcDateTime};
use crate::http_client::{HttpClient, HttpRequest};
use crate::throttling::RequestPacer;
use crate::FeedId;

const CHART_ENDPOINT: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const SECONDS_PER_DAY: i64 = 86_400;

/// Daily close history from the Yahoo Finance chart endpoint.
#[derive(Clone)]
pub struct YahooHistoryFeed {
    http_client: Arc<dyn HttpClient>,
    pacer: RequestPacer,
    timeout_ms: u64,
    base_url: String,
}

impl YahooHistoryFeed {
    pub fn new(http_client: Arc<dyn HttpClient>, pacer: RequestPacer, timeout_ms: u64) -> Self {
        Self {
            http_client,
            pacer,
            timeout_ms,
            base_url: CHART_ENDPOINT.to_owned(),
        }
    }

    /// Points the feed at another chart host, e.g. a local stub.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    fn request(&self, req: &HistoryRequest, now: UtcDateTime) -> HttpRequest {
        let period2 = now.unix_timestamp();
        let period1 = period2 - i64::from(req.lookback_days) * SECONDS_PER_DAY;
        let path = format!(
            "{}/{}",
            self.base_url,
            urlencoding::encode(&req.symbol.yahoo_symbol())
        );
        HttpRequest::get(path)
            .with_query("period1", period1)
            .with_query("period2", period2)
            .with_query("interval", "1d")
            .with_header("referer", "https://finance.yahoo.com/")
            .with_timeout(Duration::from_millis(self.timeout_ms))
    }

    #[instrument(
        skip(self, req),
        fields(symbol = %req.symbol, days = req.lookback_days),
        level = "debug"
    )]
    async fn fetch(&self, req: &HistoryRequest) -> Result<PriceSeries, SourceError> {
        self.pacer.ready().await;

        let request = self.request(req, UtcDateTime::now());
        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| SourceError::from_transport(FeedId::Yahoo, &e))?;

        if !response.is_success() {
            return Err(SourceError::from_status(FeedId::Yahoo, response.status));
        }

        let series = parse_chart(req, &response.body)?;
        debug!(points = series.len(), "yahoo history fetched");
        Ok(series)
    }
}

impl HistoryFeed for YahooHistoryFeed {
    fn id(&self) -> FeedId {
        FeedId::Yahoo
    }

    fn daily_closes<'a>(&'a self, req: &'a HistoryRequest) -> FeedFuture<'a, PriceSeries> {
        Box::pin(self.fetch(req))
    }
}

fn parse_chart(req: &HistoryRequest, body: &str) -> Result<PriceSeries, SourceError> {
    let chart: YahooChartResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::protocol(format!("yahoo chart body: {e}")))?;

    if let Some(error) = chart.chart.error.filter(|value| !value.is_null()) {
        return Err(SourceError::not_found(format!(
            "yahoo chart error for {}: {error}",
            req.symbol
        )));
    }

    let Some(result) = chart.chart.result.and_then(|results| results.into_iter().next()) else {
        return Ok(PriceSeries::empty(req.symbol.clone()));
    };

    let timestamps = result.timestamp.unwrap_or_default();
    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|quote| quote.close)
        .unwrap_or_default();

    let rows = timestamps
        .into_iter()
        .zip(closes)
        .filter_map(|(ts, close)| {
            UtcDateTime::from_unix_timestamp(ts).map(|instant| (instant.taipei_date(), close))
        });

    Ok(PriceSeries::new(req.symbol.clone(), rows))
}

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Deserialize)]
struct YahooChartData {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: YahooChartIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooChartIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}
