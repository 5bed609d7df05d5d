use std::sync::Arc;

use tickwatch_core::{RunOptions, RunStatus, UtcDateTime, WatchlistRunner};
use tracing::info;

use crate::error::CliError;
use crate::output::render_undelivered;

pub async fn execute(runner: WatchlistRunner, ignore_hours: bool) -> Result<(), CliError> {
    let runner = Arc::new(runner);
    let options = RunOptions { ignore_hours };

    let task = {
        let runner = Arc::clone(&runner);
        tokio::spawn(async move { runner.run(UtcDateTime::now(), options).await })
    };
    let report = task
        .await
        .map_err(|err| CliError::Runtime(format!("watchlist run task failed: {err}")))?;

    if report.status == RunStatus::OutsideTradingHours {
        info!("outside trading hours, no report sent");
        return Ok(());
    }

    let mut stdout = std::io::stdout().lock();
    let printed = render_undelivered(&mut stdout, report.undelivered())?;
    info!(
        run_id = %report.run_id,
        alerts = report.alert_count(),
        printed,
        "run complete"
    );
    Ok(())
}
