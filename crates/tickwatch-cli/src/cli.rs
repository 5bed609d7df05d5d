//! CLI argument definitions for tickwatch.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `run` | Evaluate the watchlist and push the report (default) |
//! | `test-push` | Send one timestamped test message |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--config` | `tickwatch.toml` | Settings file (optional when defaulted) |
//! | `--dry-run` | `false` | Print messages instead of pushing them |
//! | `--ignore-hours` | `false` | Skip the trading-hours gate |
//! | `--json-logs` | `false` | JSON log lines on stderr |
//! | `--log-level` | `info` | Level used when `RUST_LOG` is unset |
//!
//! # Examples
//!
//! ```bash
//! # Scheduled run with credentials from the environment
//! LINE_CHANNEL_TOKEN=... LINE_USER_ID=... tickwatch
//!
//! # Preview today's report without pushing
//! tickwatch run --dry-run --ignore-hours
//!
//! # Check the LINE credentials
//! tickwatch test-push
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// 📈 tickwatch - moving-average alerts for a Taiwan equity watchlist
#[derive(Debug, Parser)]
#[command(
    name = "tickwatch",
    author,
    version,
    about = "Moving-average alerts for a Taiwan equity watchlist",
    long_about = "tickwatch runs once per invocation: it resolves each watchlist code, pulls \
daily closes and a live quote, detects MA10/MA20 crosses and touches, and pushes a summary \
through the LINE Messaging API.\n\
\n\
Without LINE credentials the report is printed to stdout instead."
)]
pub struct Cli {
    /// Settings file in TOML format.
    ///
    /// When omitted, `tickwatch.toml` in the working directory is read if present.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print messages to stdout instead of pushing them.
    #[arg(long, global = true, default_value_t = false)]
    pub dry_run: bool,

    /// Run even outside the configured trading window.
    #[arg(long, global = true, default_value_t = false)]
    pub ignore_hours: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    pub json_logs: bool,

    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// The explicit subcommand, else `test-push` in legacy test mode, else `run`.
    pub fn effective_command(&self, legacy_test_mode: bool) -> Command {
        match self.command {
            Some(command) => command,
            None if legacy_test_mode => Command::TestPush,
            None => Command::Run,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Available CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// 📊 Evaluate the watchlist and deliver the report.
    ///
    /// # Examples
    ///
    ///   tickwatch run
    ///   tickwatch run --dry-run --ignore-hours
    Run,

    /// ✅ Send one timestamped test message through LINE.
    ///
    /// Falls back to printing the message when delivery fails.
    TestPush,
}
