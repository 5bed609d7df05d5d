use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::cache::{Resolution, ResolutionCache};
use crate::data_source::{HistoryFeed, HistoryRequest, SourceError, SourceErrorKind};
use crate::domain::{Market, ResolvedSymbol, Ticker};
use crate::retry::RetryConfig;

/// Why a code could not be joined with a market.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no market has history for '{code}'")]
    NotFound { code: String },
    #[error("history feed unreachable while resolving '{code}': {source}")]
    Unreachable {
        code: String,
        #[source]
        source: SourceError,
    },
}

/// Finds the market under which a bare code has daily history.
///
/// Outcomes are memoised by bare code for the lifetime of the resolver, so a
/// run issues at most one probe per candidate market for each code. A miss is
/// only memoised when every probe answered; a transport failure leaves the
/// code unresolved for a later attempt.
///
/// Each probe is retried under `retry` while the feed reports a transient
/// failure, so a single timeout does not cost the ticker its market.
pub struct SymbolResolver {
    history: Arc<dyn HistoryFeed>,
    cache: ResolutionCache,
    probe_days: u32,
    retry: RetryConfig,
}

impl SymbolResolver {
    pub fn new(history: Arc<dyn HistoryFeed>, probe_days: u32, retry: RetryConfig) -> Self {
        Self {
            history,
            cache: ResolutionCache::new(),
            probe_days: probe_days.max(1),
            retry,
        }
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    #[instrument(skip(self), fields(code = ticker.code()), level = "debug")]
    pub async fn resolve(&self, ticker: &Ticker) -> Result<ResolvedSymbol, ResolveError> {
        let code = ticker.code();
        if let Some(cached) = self.cache.get(code).await {
            debug!("resolution cache hit");
            return cached.symbol().cloned().ok_or_else(|| ResolveError::NotFound {
                code: code.to_owned(),
            });
        }

        let mut last_transient: Option<SourceError> = None;
        for market in Market::probe_order(ticker.hint()) {
            let candidate = ResolvedSymbol::new(code, market);
            match self.probe(&candidate).await {
                Ok(true) => {
                    debug!(symbol = %candidate, "resolved");
                    let stored = self.cache.insert(code, Resolution::Found(candidate)).await;
                    return stored.symbol().cloned().ok_or_else(|| ResolveError::NotFound {
                        code: code.to_owned(),
                    });
                }
                Ok(false) => {}
                Err(err) => {
                    warn!(symbol = %candidate, error = %err, "resolution probe failed");
                    last_transient = Some(err);
                }
            }
        }

        match last_transient {
            Some(source) => Err(ResolveError::Unreachable {
                code: code.to_owned(),
                source,
            }),
            None => {
                self.cache.insert(code, Resolution::Missing).await;
                Err(ResolveError::NotFound {
                    code: code.to_owned(),
                })
            }
        }
    }

    /// `Ok(false)` means the feed answered without data for this candidate.
    async fn probe(&self, candidate: &ResolvedSymbol) -> Result<bool, SourceError> {
        let request = HistoryRequest::new(candidate.clone(), self.probe_days)?;
        let outcome = self
            .retry
            .run(
                |attempt| {
                    let request = &request;
                    async move {
                        debug!(attempt, symbol = %request.symbol, "probing market");
                        self.history.daily_closes(request).await
                    }
                },
                SourceError::retryable,
            )
            .await;
        match outcome {
            Ok(series) => Ok(!series.is_empty()),
            Err(err)
                if matches!(
                    err.kind(),
                    SourceErrorKind::NotFound | SourceErrorKind::InvalidRequest
                ) =>
            {
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}
