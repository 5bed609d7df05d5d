use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::data_source::{QuoteFeed, SourceError};
use crate::domain::{LiveQuote, PriceQuote, PriceSeries, QuoteOrigin, ResolvedSymbol};
use crate::history::HistoryRetriever;

/// Current price and previous close, live feed first.
///
/// When the live entry is missing or any of its price fields is unusable the
/// latest two closes of the history feed are used instead. The live display
/// name is kept either way.
pub struct QuoteSourceAdapter {
    live: Arc<dyn QuoteFeed>,
    fallback: Arc<HistoryRetriever>,
    fallback_days: u32,
}

impl QuoteSourceAdapter {
    pub fn new(live: Arc<dyn QuoteFeed>, fallback: Arc<HistoryRetriever>, fallback_days: u32) -> Self {
        Self {
            live,
            fallback,
            fallback_days: fallback_days.max(1),
        }
    }

    /// Fetches the quote, querying the history feed when the live one fails.
    pub async fn current_and_prev(&self, symbol: &ResolvedSymbol) -> Option<PriceQuote> {
        self.current_and_prev_with(symbol, None).await
    }

    /// Like [`Self::current_and_prev`], but falls back to `known` closes first
    /// when the caller already holds a usable series for `symbol`.
    #[instrument(skip(self, known), fields(symbol = %symbol), level = "debug")]
    pub async fn current_and_prev_with(
        &self,
        symbol: &ResolvedSymbol,
        known: Option<&PriceSeries>,
    ) -> Option<PriceQuote> {
        let live = match self.live_entry(symbol).await {
            Ok(entry) => entry,
            Err(err) => {
                warn!(feed = %self.live.id(), error = %err, "live quote unavailable");
                None
            }
        };

        if let Some(quote) = live.as_ref().and_then(usable_live) {
            return Some(quote);
        }

        let name = live.and_then(|entry| entry.name);
        let from_known = known.and_then(PriceSeries::last_two);
        let closes = match from_known {
            Some(pair) => Some(pair),
            None => self
                .fallback
                .daily_closes(symbol, self.fallback_days)
                .await
                .last_two(),
        };

        match closes {
            Some((price, prev_close)) => {
                debug!(price, prev_close, "quote from history fallback");
                Some(PriceQuote {
                    name,
                    price,
                    prev_close,
                    origin: QuoteOrigin::HistoryFallback,
                })
            }
            None => {
                warn!("no usable quote from either feed");
                None
            }
        }
    }

    async fn live_entry(&self, symbol: &ResolvedSymbol) -> Result<Option<LiveQuote>, SourceError> {
        let symbols = std::slice::from_ref(symbol);
        let entries = self.live.quotes(symbols).await?;
        Ok(entries
            .into_iter()
            .find(|entry| entry.code.eq_ignore_ascii_case(&symbol.code)))
    }
}

fn usable_live(entry: &LiveQuote) -> Option<PriceQuote> {
    let price = entry.last.filter(|value| value.is_finite() && *value > 0.0)?;
    let prev_close = entry.prev_close.filter(|value| value.is_finite() && *value > 0.0)?;
    Some(PriceQuote {
        name: entry.name.clone(),
        price,
        prev_close,
        origin: QuoteOrigin::Live,
    })
}
