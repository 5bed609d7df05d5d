use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::data_source::{HistoryFeed, HistoryRequest, SourceError};
use crate::domain::{PriceSeries, ResolvedSymbol};
use crate::retry::RetryConfig;

/// Fewest closes a history response needs before it is accepted.
pub const MIN_USABLE_CLOSES: usize = 2;

enum AttemptFailure {
    TooShort(usize),
    Feed(SourceError),
}

impl AttemptFailure {
    fn retryable(&self) -> bool {
        match self {
            Self::TooShort(_) => true,
            Self::Feed(err) => err.retryable(),
        }
    }
}

/// Bounded-retry wrapper around a [`HistoryFeed`].
///
/// Never fails: exhausted or permanent failures degrade to an empty series so
/// downstream stages report "insufficient data" for the one ticker.
pub struct HistoryRetriever {
    feed: Arc<dyn HistoryFeed>,
    retry: RetryConfig,
    lookback_days: u32,
}

impl HistoryRetriever {
    pub fn new(feed: Arc<dyn HistoryFeed>, retry: RetryConfig, lookback_days: u32) -> Self {
        Self {
            feed,
            retry,
            lookback_days: lookback_days.max(1),
        }
    }

    /// Daily closes over the configured lookback window.
    pub async fn fetch(&self, symbol: &ResolvedSymbol) -> PriceSeries {
        self.daily_closes(symbol, self.lookback_days).await
    }

    #[instrument(skip(self), fields(symbol = %symbol, feed = %self.feed.id()), level = "debug")]
    pub async fn daily_closes(&self, symbol: &ResolvedSymbol, lookback_days: u32) -> PriceSeries {
        let request = match HistoryRequest::new(symbol.clone(), lookback_days) {
            Ok(request) => request,
            Err(err) => {
                warn!(error = %err, "history request rejected");
                return PriceSeries::empty(symbol.clone());
            }
        };

        let outcome = self
            .retry
            .run(
                |attempt| {
                    let request = &request;
                    async move {
                        debug!(attempt, "requesting daily closes");
                        match self.feed.daily_closes(request).await {
                            Ok(series) if series.len() >= MIN_USABLE_CLOSES => Ok(series),
                            Ok(series) => Err(AttemptFailure::TooShort(series.len())),
                            Err(err) => Err(AttemptFailure::Feed(err)),
                        }
                    }
                },
                AttemptFailure::retryable,
            )
            .await;

        match outcome {
            Ok(series) => series,
            Err(AttemptFailure::TooShort(len)) => {
                warn!(points = len, "history too short after all attempts");
                PriceSeries::empty(symbol.clone())
            }
            Err(AttemptFailure::Feed(err)) => {
                warn!(error = %err, kind = err.kind().as_str(), "history unavailable");
                PriceSeries::empty(symbol.clone())
            }
        }
    }
}
