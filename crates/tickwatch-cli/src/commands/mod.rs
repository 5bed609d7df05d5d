mod run;
mod test_push;

use std::sync::Arc;

use tickwatch_core::{ReqwestHttpClient, SettingsLoader, WatchlistRunner};
use tracing::{info, warn};

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub async fn run(cli: &Cli, command: Command) -> Result<(), CliError> {
    let runner = build_runner(cli)?;

    match command {
        Command::Run => run::execute(runner, cli.ignore_hours).await,
        Command::TestPush => test_push::execute(runner).await,
    }
}

fn build_runner(cli: &Cli) -> Result<WatchlistRunner, CliError> {
    let loader = match &cli.config {
        Some(path) => SettingsLoader::new().with_file(path),
        None => SettingsLoader::new(),
    };
    let config = loader.load()?.validate()?;
    info!(
        tickers = config.tickers.len(),
        gated = config.trading_window.is_some(),
        "configuration loaded"
    );

    let runner = WatchlistRunner::from_http(config, Arc::new(ReqwestHttpClient::new()));
    let runner = if cli.dry_run { runner.print_only() } else { runner };
    if !runner.has_notifier() {
        warn!(dry_run = cli.dry_run, "print-only mode, messages go to stdout");
    }
    Ok(runner)
}
