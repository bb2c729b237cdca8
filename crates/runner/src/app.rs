//! Scan execution for the command line

use std::future::Future;
use tracing::{debug, info};
use vrsi_scanner::{ScanConfig, ScanError, ScanEvent, ScanReport, Scanner};

/// Run one scan, logging progress, and cancel it when `shutdown` resolves
///
/// Cancellation still returns the partial report.
pub async fn execute_scan(
    scanner: &Scanner,
    config: ScanConfig,
    shutdown: impl Future<Output = ()>,
) -> Result<ScanReport, ScanError> {
    let mut handle = scanner.start_scan(config)?;
    tokio::pin!(shutdown);
    let mut interrupted = false;

    loop {
        tokio::select! {
            event = handle.next_event() => match event {
                Some(event) => {
                    log_event(&event);
                    if event.is_terminal() {
                        break;
                    }
                }
                None => break,
            },
            _ = &mut shutdown, if !interrupted => {
                info!("Interrupt received, cancelling scan");
                handle.cancel();
                interrupted = true;
            }
        }
    }

    handle.join().await
}

fn log_event(event: &ScanEvent) {
    match event {
        ScanEvent::Progress(progress) => info!(
            completed = progress.completed,
            total = progress.total,
            percent = progress.percent(),
            "Scan progress"
        ),
        ScanEvent::BatchResults(results) => debug!(results = results.len(), "Batch results"),
        ScanEvent::Started { total, .. } => debug!(total, "Universe resolved"),
        ScanEvent::EmptyUniverse { .. } | ScanEvent::Cancelled(_) | ScanEvent::Completed(_) => {}
    }
}
