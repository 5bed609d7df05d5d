mod cli;
mod commands;
mod error;
mod logger;
mod output;

use clap::Parser;
use std::process::ExitCode;

use crate::cli::Cli;
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(error) => {
            tracing::error!(error = %error, exit_code = error.exit_code(), "run aborted");
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run() -> Result<ExitCode, CliError> {
    // A missing .env is the normal case in scheduled deployments.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    logger::init_tracing(cli.json_logs, cli.log_level);

    let command = cli.effective_command(legacy_test_mode());
    commands::run(&cli, command).await?;
    Ok(ExitCode::SUCCESS)
}

/// `TEST_LINE=1` selected the push self-test before subcommands existed.
fn legacy_test_mode() -> bool {
    std::env::var("TEST_LINE").is_ok_and(|value| value.trim() == "1")
}
