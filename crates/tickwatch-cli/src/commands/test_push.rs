use tickwatch_core::{DeliveryStatus, UtcDateTime, WatchlistRunner};
use tracing::{info, warn};

use crate::error::CliError;
use crate::output::render_undelivered;

/// A failed test push is reported but still exits cleanly.
pub async fn execute(runner: WatchlistRunner) -> Result<(), CliError> {
    let delivery = runner.test_push(UtcDateTime::now()).await;

    match &delivery.status {
        DeliveryStatus::Sent => info!("test message delivered"),
        DeliveryStatus::PrintOnly => info!("no transport configured, printing test message"),
        DeliveryStatus::Failed { error } => warn!(error = %error, "test push failed"),
    }

    let mut stdout = std::io::stdout().lock();
    render_undelivered(&mut stdout, std::iter::once(&delivery))?;
    Ok(())
}
