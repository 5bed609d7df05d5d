//! Layered settings: built-in defaults, an optional TOML file, `TICKWATCH__*`
//! environment variables, then the legacy `LINE_*` variables filling gaps.
//!
//! Loading never reads ambient state when an environment map is injected,
//! which is how tests drive it.

use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::Deserialize;
use tracing::debug;

use crate::domain::Ticker;
use crate::market_hours::TradingWindow;
use crate::report::ReportAssembler;
use crate::retry::RetryConfig;
use crate::signal::{SignalMode, DEFAULT_TOUCH_TOLERANCE};
use crate::{ConfigError, ValidationError};

pub const DEFAULT_CONFIG_FILE: &str = "tickwatch.toml";
pub const ENV_PREFIX: &str = "TICKWATCH";

const LEGACY_TOKEN_VAR: &str = "LINE_CHANNEL_TOKEN";
const LEGACY_TARGET_VARS: [&str; 2] = ["LINE_USER_ID", "LINE_GROUP_ID"];
const MAX_TOUCH_TOLERANCE: f64 = 0.1;

pub const DEFAULT_WATCHLIST: [&str; 7] = ["2330", "3017", "3661", "3324", "2421", "6230", "6415"];

/// Raw settings as deserialized from all layers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(deserialize_with = "watchlist_entries")]
    pub watchlist: Vec<String>,
    pub signal: SignalSettings,
    pub history: HistorySettings,
    pub feeds: FeedSettings,
    pub trading_hours: TradingHoursSettings,
    pub report: ReportSettings,
    pub line: LineSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            watchlist: DEFAULT_WATCHLIST.iter().map(|code| (*code).to_owned()).collect(),
            signal: SignalSettings::default(),
            history: HistorySettings::default(),
            feeds: FeedSettings::default(),
            trading_hours: TradingHoursSettings::default(),
            report: ReportSettings::default(),
            line: LineSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SignalSettings {
    pub touch_tolerance: f64,
    pub mode: SignalMode,
}

impl Default for SignalSettings {
    fn default() -> Self {
        Self {
            touch_tolerance: DEFAULT_TOUCH_TOLERANCE,
            mode: SignalMode::Independent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    pub lookback_days: u32,
    pub probe_days: u32,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            lookback_days: 60,
            probe_days: 14,
            max_attempts: 3,
            retry_delay_ms: 1_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    pub request_timeout_ms: u64,
    pub request_spacing_ms: u64,
    pub concurrency: usize,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            request_timeout_ms: 8_000,
            request_spacing_ms: 250,
            concurrency: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TradingHoursSettings {
    pub enabled: bool,
    pub open: String,
    pub close: String,
}

impl Default for TradingHoursSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            open: String::from("09:00"),
            close: String::from("13:30"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub max_chunk_chars: usize,
    pub alert_digest: bool,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            max_chunk_chars: crate::report::DEFAULT_MAX_CHUNK_CHARS,
            alert_digest: false,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct LineSettings {
    pub channel_token: Option<String>,
    pub target_id: Option<String>,
}

impl Debug for LineSettings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineSettings")
            .field("channel_token", &self.channel_token.as_ref().map(|_| "<redacted>"))
            .field("target_id", &self.target_id)
            .finish()
    }
}

/// Push credentials, present only when both parts are non-blank.
#[derive(Clone, PartialEq, Eq)]
pub struct LineCredentials {
    pub channel_token: String,
    pub target_id: String,
}

impl Debug for LineCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineCredentials")
            .field("channel_token", &"<redacted>")
            .field("target_id", &self.target_id)
            .finish()
    }
}

/// Validated settings handed to the run pipeline.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub tickers: Vec<Ticker>,
    pub touch_tolerance: f64,
    pub signal_mode: SignalMode,
    pub lookback_days: u32,
    pub probe_days: u32,
    pub history_retry: RetryConfig,
    pub request_timeout_ms: u64,
    pub request_spacing: Duration,
    pub concurrency: usize,
    /// `None` when the gate is disabled.
    pub trading_window: Option<TradingWindow>,
    pub assembler: ReportAssembler,
    pub alert_digest: bool,
    /// `None` means print-only mode.
    pub line: Option<LineCredentials>,
}

impl Settings {
    pub fn validate(&self) -> Result<WatchConfig, ConfigError> {
        if self.watchlist.is_empty() {
            return Err(ConfigError::invalid("watchlist", ValidationError::EmptyWatchlist));
        }
        let tickers = self
            .watchlist
            .iter()
            .map(|entry| Ticker::parse(entry))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| ConfigError::invalid("watchlist", err))?;

        let tolerance = self.signal.touch_tolerance;
        if !tolerance.is_finite() {
            return Err(ConfigError::invalid(
                "signal.touch_tolerance",
                ValidationError::NonFiniteValue {
                    field: "signal.touch_tolerance",
                },
            ));
        }
        if tolerance <= 0.0 || tolerance > MAX_TOUCH_TOLERANCE {
            return Err(ConfigError::invalid(
                "signal.touch_tolerance",
                ValidationError::TouchToleranceOutOfRange { value: tolerance },
            ));
        }

        non_zero("history.lookback_days", u64::from(self.history.lookback_days))?;
        non_zero("history.probe_days", u64::from(self.history.probe_days))?;
        non_zero("history.max_attempts", u64::from(self.history.max_attempts))?;
        non_zero("feeds.request_timeout_ms", self.feeds.request_timeout_ms)?;
        non_zero("feeds.concurrency", self.feeds.concurrency as u64)?;

        let window = TradingWindow::parse(&self.trading_hours.open, &self.trading_hours.close)
            .map_err(|err| ConfigError::invalid("trading_hours", err))?;

        let assembler = ReportAssembler::new(self.report.max_chunk_chars)
            .map_err(|err| ConfigError::invalid("report.max_chunk_chars", err))?;

        Ok(WatchConfig {
            tickers,
            touch_tolerance: tolerance,
            signal_mode: self.signal.mode,
            lookback_days: self.history.lookback_days,
            probe_days: self.history.probe_days,
            history_retry: RetryConfig::constant(
                Duration::from_millis(self.history.retry_delay_ms),
                self.history.max_attempts,
            ),
            request_timeout_ms: self.feeds.request_timeout_ms,
            request_spacing: Duration::from_millis(self.feeds.request_spacing_ms),
            concurrency: self.feeds.concurrency,
            trading_window: self.trading_hours.enabled.then_some(window),
            assembler,
            alert_digest: self.report.alert_digest,
            line: self.line_credentials(),
        })
    }

    pub fn line_credentials(&self) -> Option<LineCredentials> {
        let channel_token = non_blank(self.line.channel_token.as_deref())?;
        let target_id = non_blank(self.line.target_id.as_deref())?;
        Some(LineCredentials {
            channel_token,
            target_id,
        })
    }
}

fn non_zero(key: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::invalid(key, ValidationError::ZeroValue { field: key }));
    }
    Ok(())
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

/// Builds [`Settings`] from the configured layers.
#[derive(Debug, Clone, Default)]
pub struct SettingsLoader {
    file: Option<PathBuf>,
    file_required: bool,
    env: Option<HashMap<String, String>>,
}

impl SettingsLoader {
    /// Optional `tickwatch.toml` in the working directory plus process env.
    pub fn new() -> Self {
        Self {
            file: Some(PathBuf::from(DEFAULT_CONFIG_FILE)),
            file_required: false,
            env: None,
        }
    }

    /// Uses `path` instead of the default file; it must exist.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self.file_required = true;
        self
    }

    pub fn without_file(mut self) -> Self {
        self.file = None;
        self.file_required = false;
        self
    }

    /// Replaces the process environment for both the prefixed and legacy layers.
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = Some(env);
        self
    }

    pub fn load(&self) -> Result<Settings, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = &self.file {
            debug!(path = %path.display(), required = self.file_required, "loading config file");
            builder = builder.add_source(
                File::from(path.as_path())
                    .format(FileFormat::Toml)
                    .required(self.file_required),
            );
        }

        let environment = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__");
        let environment = match &self.env {
            Some(env) => environment.source(Some(
                env.iter()
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect(),
            )),
            None => environment,
        };
        builder = builder.add_source(environment);

        let mut settings: Settings = builder.build()?.try_deserialize()?;
        self.apply_legacy(&mut settings);
        Ok(settings)
    }

    fn apply_legacy(&self, settings: &mut Settings) {
        if non_blank(settings.line.channel_token.as_deref()).is_none() {
            if let Some(token) = self.lookup(LEGACY_TOKEN_VAR) {
                settings.line.channel_token = Some(token);
            }
        }
        if non_blank(settings.line.target_id.as_deref()).is_none() {
            if let Some(target) = LEGACY_TARGET_VARS.iter().find_map(|var| self.lookup(var)) {
                settings.line.target_id = Some(target);
            }
        }
    }

    fn lookup(&self, key: &str) -> Option<String> {
        let value = match &self.env {
            Some(env) => env.get(key).cloned(),
            None => std::env::var(key).ok(),
        };
        non_blank(value.as_deref())
    }
}

/// Accepts a TOML array (of strings or numbers) or one comma-separated string.
fn watchlist_entries<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct WatchlistVisitor;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Entry {
        Text(String),
        Number(u64),
    }

    impl<'de> Visitor<'de> for WatchlistVisitor {
        type Value = Vec<String>;

        fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str("a list of ticker codes or a comma-separated string")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            Ok(value
                .split(',')
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .map(str::to_owned)
                .collect())
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            Ok(vec![value.to_string()])
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            Ok(vec![value.to_string()])
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut codes = Vec::new();
            while let Some(entry) = seq.next_element::<Entry>()? {
                let code = match entry {
                    Entry::Text(text) => text.trim().to_owned(),
                    Entry::Number(number) => number.to_string(),
                };
                if !code.is_empty() {
                    codes.push(code);
                }
            }
            Ok(codes)
        }
    }

    deserializer.deserialize_any(WatchlistVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect()
    }

    fn load(pairs: &[(&str, &str)]) -> Settings {
        SettingsLoader::new()
            .without_file()
            .with_env(env(pairs))
            .load()
            .expect("settings load")
    }

    #[test]
    fn defaults_match_documented_values() {
        let settings = load(&[]);
        assert_eq!(settings, Settings::default());

        let config = settings.validate().expect("defaults are valid");
        assert_eq!(config.tickers.len(), 7);
        assert_eq!(config.touch_tolerance, 0.005);
        assert_eq!(config.history_retry.attempts(), 3);
        assert_eq!(config.assembler.max_chunk_chars(), 900);
        assert!(config.trading_window.is_none());
        assert!(config.line.is_none());
    }

    #[test]
    fn prefixed_env_overrides_defaults() {
        let settings = load(&[
            ("TICKWATCH__WATCHLIST", "2330, 6488.TWO"),
            ("TICKWATCH__SIGNAL__TOUCH_TOLERANCE", "0.004"),
            ("TICKWATCH__SIGNAL__MODE", "exclusive"),
            ("TICKWATCH__TRADING_HOURS__ENABLED", "true"),
        ]);

        assert_eq!(settings.watchlist, vec!["2330", "6488.TWO"]);
        assert_eq!(settings.signal.touch_tolerance, 0.004);
        assert_eq!(settings.signal.mode, SignalMode::Exclusive);
        assert!(settings.trading_hours.enabled);
    }

    #[test]
    fn legacy_line_variables_fill_gaps_user_first() {
        let settings = load(&[
            ("LINE_CHANNEL_TOKEN", "legacy-token"),
            ("LINE_GROUP_ID", "C-group"),
            ("LINE_USER_ID", "U-user"),
        ]);
        let credentials = settings.line_credentials().expect("credentials present");
        assert_eq!(credentials.channel_token, "legacy-token");
        assert_eq!(credentials.target_id, "U-user");
    }

    #[test]
    fn prefixed_credentials_win_over_legacy() {
        let settings = load(&[
            ("TICKWATCH__LINE__CHANNEL_TOKEN", "new-token"),
            ("LINE_CHANNEL_TOKEN", "legacy-token"),
            ("LINE_GROUP_ID", "C-group"),
        ]);
        let credentials = settings.line_credentials().expect("credentials present");
        assert_eq!(credentials.channel_token, "new-token");
        assert_eq!(credentials.target_id, "C-group");
    }

    #[test]
    fn blank_credentials_mean_print_only() {
        let settings = load(&[("LINE_CHANNEL_TOKEN", "  "), ("LINE_USER_ID", "U1")]);
        assert!(settings.line_credentials().is_none());
    }

    #[test]
    fn credentials_are_redacted_in_debug_output() {
        let settings = load(&[("LINE_CHANNEL_TOKEN", "secret-token"), ("LINE_USER_ID", "U1")]);
        let config = settings.validate().expect("valid");
        assert!(!format!("{settings:?}").contains("secret-token"));
        assert!(!format!("{config:?}").contains("secret-token"));
    }

    #[test]
    fn toml_file_layer_is_read() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        writeln!(
            file,
            "watchlist = [2330, \"3017\"]\n[report]\nmax_chunk_chars = 1200\nalert_digest = true"
        )
        .expect("write config");

        let settings = SettingsLoader::new()
            .with_file(file.path())
            .with_env(HashMap::new())
            .load()
            .expect("settings load");

        assert_eq!(settings.watchlist, vec!["2330", "3017"]);
        assert_eq!(settings.report.max_chunk_chars, 1200);
        assert!(settings.report.alert_digest);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = SettingsLoader::new()
            .with_file("/nonexistent/tickwatch.toml")
            .with_env(HashMap::new())
            .load();
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.signal.touch_tolerance = 0.2;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::Invalid {
                key: "signal.touch_tolerance",
                ..
            })
        ));

        let mut settings = Settings::default();
        settings.watchlist = vec![String::from("23$0")];
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::Invalid { key: "watchlist", .. })
        ));

        let mut settings = Settings::default();
        settings.feeds.concurrency = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.report.max_chunk_chars = 50;
        assert!(settings.validate().is_err());
    }
}
