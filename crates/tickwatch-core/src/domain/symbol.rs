use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MAX_CODE_LEN: usize = 10;

/// Taiwan venue an instrument is listed on.
///
/// The two venues use different suffixes on the history feed and different
/// channel prefixes on the live quote feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Market {
    /// Taiwan Stock Exchange main board (`.TW`).
    Listed,
    /// Taipei Exchange over-the-counter market (`.TWO`).
    OverTheCounter,
}

impl Market {
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Listed => "TW",
            Self::OverTheCounter => "TWO",
        }
    }

    /// Channel prefix used by the TWSE MIS quote endpoint.
    pub const fn mis_prefix(self) -> &'static str {
        match self {
            Self::Listed => "tse",
            Self::OverTheCounter => "otc",
        }
    }

    pub const fn counterpart(self) -> Self {
        match self {
            Self::Listed => Self::OverTheCounter,
            Self::OverTheCounter => Self::Listed,
        }
    }

    /// Candidate order used by symbol resolution.
    ///
    /// A hinted market is probed first; without a hint the main board wins.
    pub const fn probe_order(hint: Option<Self>) -> [Self; 2] {
        match hint {
            Some(market) => [market, market.counterpart()],
            None => [Self::Listed, Self::OverTheCounter],
        }
    }
}

impl Display for Market {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for Market {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "TW" => Ok(Self::Listed),
            "TWO" => Ok(Self::OverTheCounter),
            other => Err(ValidationError::InvalidMarketSuffix {
                value: other.to_owned(),
            }),
        }
    }
}

/// Watchlist entry as supplied by configuration.
///
/// Accepts either a bare code (`2330`) or a code with a market suffix
/// (`6415.TWO`). The suffix is kept only as a resolution hint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ticker {
    code: String,
    hint: Option<Market>,
}

impl Ticker {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        let (raw_code, hint) = match trimmed.rsplit_once('.') {
            Some((code, suffix)) => (code, Some(suffix.parse::<Market>()?)),
            None => (trimmed, None),
        };

        let code = raw_code.to_ascii_uppercase();
        if code.is_empty() {
            return Err(ValidationError::EmptyTicker);
        }

        let len = code.chars().count();
        if len > MAX_CODE_LEN {
            return Err(ValidationError::TickerTooLong {
                len,
                max: MAX_CODE_LEN,
            });
        }

        for (index, ch) in code.chars().enumerate() {
            if !ch.is_ascii_alphanumeric() {
                return Err(ValidationError::TickerInvalidChar { ch, index });
            }
        }

        Ok(Self { code, hint })
    }

    /// Bare instrument code with any suffix stripped.
    pub fn code(&self) -> &str {
        &self.code
    }

    pub const fn hint(&self) -> Option<Market> {
        self.hint
    }
}

impl Display for Ticker {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.hint {
            Some(market) => write!(f, "{}.{}", self.code, market),
            None => f.write_str(&self.code),
        }
    }
}

impl TryFrom<&str> for Ticker {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

/// Bare code joined with the market under which history was found.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedSymbol {
    pub code: String,
    pub market: Market,
}

impl ResolvedSymbol {
    pub fn new(code: impl Into<String>, market: Market) -> Self {
        Self {
            code: code.into(),
            market,
        }
    }

    /// Fully-qualified history feed symbol, e.g. `2330.TW`.
    pub fn yahoo_symbol(&self) -> String {
        format!("{}.{}", self.code, self.market.suffix())
    }

    /// Live quote channel, e.g. `tse_2330.tw`.
    pub fn mis_channel(&self) -> String {
        format!("{}_{}.tw", self.market.mis_prefix(), self.code.to_ascii_lowercase())
    }
}

impl Display for ResolvedSymbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.code, self.market.suffix())
    }
}
