use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Upstream feed identifiers used in logs and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedId {
    /// TWSE MIS live quote endpoint.
    Twse,
    /// Yahoo Finance chart endpoint.
    Yahoo,
}

impl FeedId {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Twse => "twse",
            Self::Yahoo => "yahoo",
        }
    }
}

impl Display for FeedId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
