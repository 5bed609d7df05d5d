use thiserror::Error;

/// Validation and contract errors exposed by `tickwatch-core`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("ticker code cannot be empty")]
    EmptyTicker,
    #[error("ticker code length {len} exceeds max {max}")]
    TickerTooLong { len: usize, max: usize },
    #[error("ticker code contains invalid character '{ch}' at index {index}")]
    TickerInvalidChar { ch: char, index: usize },
    #[error("unknown market suffix '{value}', expected one of TW, TWO")]
    InvalidMarketSuffix { value: String },

    #[error("watchlist must contain at least one ticker")]
    EmptyWatchlist,
    #[error("touch tolerance {value} must be within (0, 0.1]")]
    TouchToleranceOutOfRange { value: f64 },
    #[error("field '{field}' must be greater than zero")]
    ZeroValue { field: &'static str },
    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("chunk cap {value} must be within [{min}, {max}] characters")]
    ChunkCapOutOfRange { value: usize, min: usize, max: usize },
    #[error("time of day must be HH:MM (24h): '{value}'")]
    InvalidTimeOfDay { value: String },
    #[error("trading window open {open} must be earlier than close {close}")]
    EmptyTradingWindow { open: String, close: String },
    #[error("invalid signal mode '{value}', expected one of independent, exclusive")]
    InvalidSignalMode { value: String },
}

/// Errors raised while loading and validating [`crate::config::Settings`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration value for '{key}': {source}")]
    Invalid {
        key: &'static str,
        #[source]
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn invalid(key: &'static str, source: ValidationError) -> Self {
        Self::Invalid { key, source }
    }
}
