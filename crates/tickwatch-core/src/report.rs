//! Per-ticker lines and length-capped message chunks.
//!
//! Every watched ticker contributes exactly one line, in watchlist order.
//! Lines are never split across chunks; chunks repeat the header and never
//! exceed the cap.

use serde::Serialize;

use crate::domain::{PriceQuote, ResolvedSymbol, UtcDateTime};
use crate::indicators::{AveragePeriod, MovingAverageSnapshot};
use crate::signal::{Event, EventKind, Position};
use crate::ValidationError;

pub const DEFAULT_MAX_CHUNK_CHARS: usize = 900;
/// Room for the header plus the longest line two events can produce.
pub const MIN_CHUNK_CHARS: usize = 200;
pub const MAX_CHUNK_CHARS: usize = 5_000;

const SEPARATOR: &str = " · ";

/// Why a ticker produced no evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    /// Neither market had history for the code.
    SymbolNotFound,
    /// The history feed could not be reached during resolution.
    FeedUnreachable,
    /// Neither the live feed nor history supplied a usable price.
    NoQuote,
}

impl UnavailableReason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SymbolNotFound => "symbol not found",
            Self::FeedUnreachable => "feed unreachable",
            Self::NoQuote => "no quote",
        }
    }
}

/// Evaluated state of one ticker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerReport {
    pub symbol: ResolvedSymbol,
    pub quote: PriceQuote,
    pub snapshot: MovingAverageSnapshot,
    pub events: Vec<Event>,
}

impl TickerReport {
    fn label(&self) -> String {
        match self.quote.name.as_deref() {
            Some(name) if !name.eq_ignore_ascii_case(&self.symbol.code) => {
                format!("{} {name}", self.symbol.code)
            }
            _ => self.symbol.code.clone(),
        }
    }

    fn price_segment(&self) -> String {
        let price = format!("{:.2}", self.quote.price);
        match self.quote.change_pct() {
            Some(pct) => format!("{price} {}", change_marker(pct)),
            None => price,
        }
    }

    fn average(&self, period: AveragePeriod) -> Option<f64> {
        self.snapshot.get(period).current
    }

    fn event_text(&self, event: &Event) -> String {
        let average = self
            .average(event.period)
            .map(|value| format!("{value:.2}"))
            .unwrap_or_else(|| String::from("--"));
        match event.kind {
            EventKind::CrossUp => format!("⬆️ crossed above {} {average}", event.period),
            EventKind::CrossDown => format!("⬇️ crossed below {} {average}", event.period),
            EventKind::Touch => format!("📍 near {} {average}", event.period),
        }
    }

    fn position_text(&self, period: AveragePeriod) -> String {
        match self
            .average(period)
            .and_then(|average| Position::of(self.quote.price, average).map(|p| (average, p)))
        {
            Some((average, position)) => format!("{} {period} {average:.2}", position.as_str()),
            None => format!("{period} --"),
        }
    }

    /// Events first, then the position against every average no event named.
    fn detail(&self) -> String {
        let quiet = AveragePeriod::ALL
            .into_iter()
            .filter(|period| self.events.iter().all(|event| event.period != *period))
            .map(|period| self.position_text(period));
        self.events
            .iter()
            .map(|event| self.event_text(event))
            .chain(quiet)
            .collect::<Vec<_>>()
            .join(SEPARATOR)
    }
}

/// What one watchlist entry turned into.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TickerOutcome {
    Unavailable {
        code: String,
        reason: UnavailableReason,
    },
    Evaluated(TickerReport),
}

impl TickerOutcome {
    pub fn unavailable(code: impl Into<String>, reason: UnavailableReason) -> Self {
        Self::Unavailable {
            code: code.into(),
            reason,
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::Unavailable { code, .. } => code,
            Self::Evaluated(report) => &report.symbol.code,
        }
    }

    pub fn events(&self) -> &[Event] {
        match self {
            Self::Unavailable { .. } => &[],
            Self::Evaluated(report) => &report.events,
        }
    }

    pub fn is_alert(&self) -> bool {
        !self.events().is_empty()
    }

    /// The single line this ticker contributes to the summary.
    pub fn line(&self) -> String {
        match self {
            Self::Unavailable { code, reason } => {
                format!("{code} | ⚠️ data unavailable ({})", reason.as_str())
            }
            Self::Evaluated(report) => format!(
                "{} | {} | {}",
                report.label(),
                report.price_segment(),
                report.detail()
            ),
        }
    }
}

fn change_marker(pct: f64) -> String {
    // Rounds through the display precision so "-0.00" never shows.
    let shown = (pct * 100.0).round() / 100.0;
    if shown > 0.0 {
        format!("🔺{shown:.2}%")
    } else if shown < 0.0 {
        format!("🔻{:.2}%", shown.abs())
    } else {
        String::from("⏺0.00%")
    }
}

/// One deliverable message: a header followed by whole lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageChunk {
    pub header: String,
    pub lines: Vec<String>,
}

impl MessageChunk {
    pub fn text(&self) -> String {
        let mut text = self.header.clone();
        for line in &self.lines {
            text.push('\n');
            text.push_str(line);
        }
        text
    }

    /// Length in characters, as the messaging channel counts it.
    pub fn char_len(&self) -> usize {
        self.header.chars().count()
            + self
                .lines
                .iter()
                .map(|line| line.chars().count() + 1)
                .sum::<usize>()
    }
}

/// Builds summary and alert chunks under a character cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportAssembler {
    max_chunk_chars: usize,
}

impl Default for ReportAssembler {
    fn default() -> Self {
        Self {
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
        }
    }
}

impl ReportAssembler {
    pub fn new(max_chunk_chars: usize) -> Result<Self, ValidationError> {
        if !(MIN_CHUNK_CHARS..=MAX_CHUNK_CHARS).contains(&max_chunk_chars) {
            return Err(ValidationError::ChunkCapOutOfRange {
                value: max_chunk_chars,
                min: MIN_CHUNK_CHARS,
                max: MAX_CHUNK_CHARS,
            });
        }
        Ok(Self { max_chunk_chars })
    }

    pub const fn max_chunk_chars(&self) -> usize {
        self.max_chunk_chars
    }

    pub fn summary_header(generated_at: UtcDateTime) -> String {
        format!("📊 Watchlist {} (Taipei)", generated_at.format_taipei_minute())
    }

    pub fn alert_header(generated_at: UtcDateTime) -> String {
        format!("📣 MA alerts {} (Taipei)", generated_at.format_taipei_minute())
    }

    /// One line per outcome, in order, chunked under the summary header.
    pub fn assemble(&self, outcomes: &[TickerOutcome], generated_at: UtcDateTime) -> Vec<MessageChunk> {
        let lines = outcomes.iter().map(TickerOutcome::line).collect();
        self.chunk(Self::summary_header(generated_at), lines)
    }

    /// Event lines only; empty when nothing fired.
    pub fn alert_digest(
        &self,
        outcomes: &[TickerOutcome],
        generated_at: UtcDateTime,
    ) -> Vec<MessageChunk> {
        let lines: Vec<String> = outcomes
            .iter()
            .filter(|outcome| outcome.is_alert())
            .map(TickerOutcome::line)
            .collect();
        if lines.is_empty() {
            return Vec::new();
        }
        self.chunk(Self::alert_header(generated_at), lines)
    }

    /// Greedy packing. A line that cannot fit even alone under the header is
    /// clipped and ends in `…`.
    pub fn chunk(&self, header: String, lines: Vec<String>) -> Vec<MessageChunk> {
        let header_len = header.chars().count();
        let room = self.max_chunk_chars.saturating_sub(header_len + 1);
        let mut chunks = Vec::new();
        let mut current: Vec<String> = Vec::new();
        let mut current_len = header_len;

        for line in lines {
            let line = clip(line, room);
            let added = line.chars().count() + 1;
            if !current.is_empty() && current_len + added > self.max_chunk_chars {
                chunks.push(MessageChunk {
                    header: header.clone(),
                    lines: std::mem::take(&mut current),
                });
                current_len = header_len;
            }
            current_len += added;
            current.push(line);
        }

        if !current.is_empty() || chunks.is_empty() {
            chunks.push(MessageChunk {
                header,
                lines: current,
            });
        }
        chunks
    }
}

fn clip(line: String, room: usize) -> String {
    if line.chars().count() <= room {
        return line;
    }
    if room == 0 {
        return String::new();
    }
    let mut clipped: String = line.chars().take(room - 1).collect();
    clipped.push('…');
    clipped
}
