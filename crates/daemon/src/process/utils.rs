use std::time::Duration;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// How long in-flight requests get after SIGTERM before the servers stop.
const REQUEST_GRACE_PERIOD: Duration = Duration::from_secs(10);

pub type ShutdownParts = (JoinHandle<()>, watch::Sender<()>, watch::Receiver<()>);

/// Spawn a task that waits for SIGINT or SIGTERM and then fires the shutdown watch.
///
/// Returns the task handle, the sender (for programmatic shutdown) and a receiver to clone
/// into every service.
pub fn graceful_shutdown_blocker() -> std::io::Result<ShutdownParts> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    let (tx, rx) = watch::channel(());
    let signal_tx = tx.clone();
    let mut programmatic_rx = rx.clone();

    let handle = tokio::spawn(async move {
        tokio::select! {
            _ = sigint.recv() => {
                tracing::debug!("SIGINT received, shutting down now");
            }
            _ = sigterm.recv() => {
                tracing::debug!(
                    grace_secs = REQUEST_GRACE_PERIOD.as_secs(),
                    "SIGTERM received, shutting down after grace period"
                );
                tokio::time::sleep(REQUEST_GRACE_PERIOD).await;
            }
            _ = programmatic_rx.changed() => {
                tracing::debug!("shutdown requested");
            }
        }

        let _ = signal_tx.send(());
    });

    Ok((handle, tx, rx))
}

/// Route panics through `tracing` so they land in the log file too.
pub fn register_panic_logger() {
    std::panic::set_hook(Box::new(|panic| match panic.location() {
        Some(loc) => {
            tracing::error!(
                message = %panic,
                panic.file = loc.file(),
                panic.line = loc.line(),
                panic.column = loc.column(),
            );
        }
        None => tracing::error!(message = %panic),
    }));
}

pub fn report_build_info() {
    let build = common::prelude::build_info();

    tracing::info!(
        build_profile = ?build.build_profile,
        features = ?build.build_features,
        version = ?build.version,
        "parley node starting up"
    );
}
