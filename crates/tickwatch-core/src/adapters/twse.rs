use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::data_source::{FeedFuture, QuoteFeed, SourceError};
use crate::domain::{LiveQuote, ResolvedSymbol};
use crate::http_client::{HttpClient, HttpRequest};
use crate::throttling::RequestPacer;
use crate::FeedId;

const MIS_ENDPOINT: &str = "https://mis.twse.com.tw/stock/api/getStockInfo.jsp";

/// Live quotes from the TWSE MIS endpoint, one batched call per request.
#[derive(Clone)]
pub struct TwseQuoteFeed {
    http_client: Arc<dyn HttpClient>,
    pacer: RequestPacer,
    timeout_ms: u64,
    base_url: String,
}

impl TwseQuoteFeed {
    pub fn new(http_client: Arc<dyn HttpClient>, pacer: RequestPacer, timeout_ms: u64) -> Self {
        Self {
            http_client,
            pacer,
            timeout_ms,
            base_url: MIS_ENDPOINT.to_owned(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request(&self, symbols: &[ResolvedSymbol]) -> HttpRequest {
        let channels = symbols
            .iter()
            .map(ResolvedSymbol::mis_channel)
            .collect::<Vec<_>>()
            .join("|");
        HttpRequest::get(self.base_url.as_str())
            .with_query("ex_ch", channels)
            .with_query("json", 1)
            .with_query("delay", 0)
            .with_header("referer", "https://mis.twse.com.tw/stock/index.jsp")
            .with_timeout(Duration::from_millis(self.timeout_ms))
    }

    #[instrument(skip(self, symbols), fields(count = symbols.len()), level = "debug")]
    async fn fetch(&self, symbols: &[ResolvedSymbol]) -> Result<Vec<LiveQuote>, SourceError> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }

        self.pacer.ready().await;

        let request = self.request(symbols);
        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| SourceError::from_transport(FeedId::Twse, &e))?;

        if !response.is_success() {
            return Err(SourceError::from_status(FeedId::Twse, response.status));
        }

        let quotes = parse_quotes(&response.body)?;
        debug!(returned = quotes.len(), "twse quotes fetched");
        Ok(quotes)
    }
}

impl QuoteFeed for TwseQuoteFeed {
    fn id(&self) -> FeedId {
        FeedId::Twse
    }

    fn quotes<'a>(&'a self, symbols: &'a [ResolvedSymbol]) -> FeedFuture<'a, Vec<LiveQuote>> {
        Box::pin(self.fetch(symbols))
    }
}

fn parse_quotes(body: &str) -> Result<Vec<LiveQuote>, SourceError> {
    let payload: MisResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::protocol(format!("twse quote body: {e}")))?;

    if let Some(code) = payload.rtcode.as_deref() {
        if code != "0000" {
            return Err(SourceError::unavailable(format!(
                "twse returned rtcode {code}: {}",
                payload.rtmsg.unwrap_or_default()
            )));
        }
    }

    Ok(payload
        .msg_array
        .into_iter()
        .filter_map(|entry| {
            let code = entry.code?.trim().to_ascii_uppercase();
            if code.is_empty() {
                return None;
            }
            Some(LiveQuote {
                code,
                name: entry
                    .name
                    .map(|name| name.trim().to_owned())
                    .filter(|name| !name.is_empty()),
                last: entry.last.as_deref().and_then(parse_price),
                prev_close: entry.prev_close.as_deref().and_then(parse_price),
            })
        })
        .collect())
}

/// `-`, blanks and `0` (no trade yet) are absent values, not zero.
fn parse_price(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return None;
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value > 0.0)
}

#[derive(Debug, Deserialize)]
struct MisResponse {
    #[serde(rename = "msgArray", default)]
    msg_array: Vec<MisEntry>,
    #[serde(default)]
    rtcode: Option<String>,
    #[serde(default)]
    rtmsg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MisEntry {
    #[serde(rename = "c", default)]
    code: Option<String>,
    #[serde(rename = "n", default)]
    name: Option<String>,
    #[serde(rename = "z", default)]
    last: Option<String>,
    #[serde(rename = "y", default)]
    prev_close: Option<String>,
}
