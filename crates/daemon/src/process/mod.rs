pub mod utils;

use std::net::SocketAddr;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use common::protocol::{ChannelSink, ChatEvent, Direction};

use crate::http_server;
use crate::{ServiceConfig, ServiceState};

const FINAL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Log target for the conversation itself, so it can be filtered apart from the node's
/// own diagnostics (`RUST_LOG=chat=info`).
pub const CHAT_LOG_TARGET: &str = "chat";

/// Handle for gracefully shutting down a running node.
pub struct ShutdownHandle {
    graceful_waiter: tokio::task::JoinHandle<()>,
    handles: Vec<tokio::task::JoinHandle<()>>,
    shutdown_tx: watch::Sender<()>,
}

impl ShutdownHandle {
    /// Block until the node shuts down (via signal or explicit shutdown).
    pub async fn wait(self) {
        shutdown_and_join(self.graceful_waiter, self.handles).await;
    }

    /// Trigger shutdown programmatically.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

/// Install the global subscriber: compact stdout always, plus a daily rolling file under
/// `log_dir` when one is configured. The returned guards flush the writers on drop.
fn init_logging(
    service_config: &ServiceConfig,
) -> Vec<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::fmt::format::FmtSpan;

    let mut guards = Vec::new();

    let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    guards.push(stdout_guard);

    let stdout_env_filter = EnvFilter::builder()
        .with_default_directive(service_config.log_level.into())
        .from_env_lossy();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(stdout_writer)
        .with_filter(stdout_env_filter);

    if let Some(log_dir) = &service_config.log_dir {
        if let Err(e) = std::fs::create_dir_all(log_dir) {
            eprintln!(
                "Warning: Failed to create log directory {:?}: {}",
                log_dir, e
            );
        }

        let file_appender = tracing_appender::rolling::daily(log_dir, "parley.log");
        let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
        guards.push(file_guard);

        let file_env_filter = EnvFilter::builder()
            .with_default_directive(service_config.log_level.into())
            .from_env_lossy();

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_writer)
            .with_ansi(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(file_env_filter);

        tracing_subscriber::registry()
            .with(stdout_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry().with(stdout_layer).init();
    }

    utils::register_panic_logger();
    utils::report_build_info();

    guards
}

/// Create service state from config, exiting on error.
async fn create_state(service_config: &ServiceConfig, events: ChannelSink) -> ServiceState {
    match ServiceState::from_config(service_config, events).await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("error creating node state: {}", e);
            std::process::exit(3);
        }
    }
}

/// Wait for shutdown and join all handles with timeout.
async fn shutdown_and_join(
    graceful_waiter: tokio::task::JoinHandle<()>,
    handles: Vec<tokio::task::JoinHandle<()>>,
) {
    let _ = graceful_waiter.await;

    if timeout(FINAL_SHUTDOWN_TIMEOUT, join_all(handles))
        .await
        .is_err()
    {
        tracing::error!(
            "Failed to shut down within {} seconds",
            FINAL_SHUTDOWN_TIMEOUT.as_secs()
        );
        std::process::exit(4);
    }
}

fn log_event(event: &ChatEvent) {
    match event {
        ChatEvent::Message {
            text,
            direction: Direction::Sent,
            user,
            timestamp,
        } => tracing::info!(target: CHAT_LOG_TARGET, %timestamp, "{} -> {}", user, text),
        ChatEvent::Message {
            text,
            direction: Direction::Received,
            user,
            timestamp,
        } => tracing::info!(target: CHAT_LOG_TARGET, %timestamp, "{} <- {}", user, text),
        ChatEvent::Error { text, error } => {
            tracing::warn!(target: CHAT_LOG_TARGET, "not delivered: {} ({})", text, error)
        }
    }
}

/// Log chat events until every sender is gone or shutdown fires. Returns how many were
/// logged.
pub async fn drain_events(
    events: flume::Receiver<ChatEvent>,
    mut shutdown_rx: watch::Receiver<()>,
) -> usize {
    let mut logged = 0;
    loop {
        tokio::select! {
            event = events.recv_async() => match event {
                Ok(event) => {
                    log_event(&event);
                    logged += 1;
                }
                Err(_) => break,
            },
            _ = shutdown_rx.changed() => break,
        }
    }
    tracing::debug!(logged, "event drain stopped");
    logged
}

/// Create state and spawn the node's tasks, returning the state handle.
///
/// Spawns the event drain, the API server and, if configured, an initial handshake with
/// the peer. The returned `ShutdownHandle` must be kept alive; dropping it does not stop
/// the node.
pub async fn start_service(service_config: &ServiceConfig) -> (ServiceState, ShutdownHandle) {
    let (graceful_waiter, shutdown_tx, shutdown_rx) = match utils::graceful_shutdown_blocker() {
        Ok(parts) => parts,
        Err(e) => {
            tracing::error!("failed to install signal handlers: {}", e);
            std::process::exit(2);
        }
    };
    let (events, events_rx) = ChannelSink::new();
    let state = create_state(service_config, events).await;

    let mut handles = Vec::new();

    let drain_rx = shutdown_rx.clone();
    handles.push(tokio::spawn(async move {
        drain_events(events_rx, drain_rx).await;
    }));

    // API server
    let api_port = service_config.api_port;
    let api_addr = SocketAddr::from(([0, 0, 0, 0], api_port));
    let mut api_config = http_server::Config::new(api_addr);
    api_config.log_level = service_config.log_level;
    let api_state = state.clone();
    let api_rx = shutdown_rx.clone();
    handles.push(tokio::spawn(async move {
        if let Err(e) = http_server::run_api(api_config, api_state, api_rx).await {
            tracing::error!("API server error: {}", e);
        }
    }));

    if service_config.handshake_on_start {
        let node = state.node().clone();
        let mut handshake_rx = shutdown_rx.clone();
        handles.push(tokio::spawn(async move {
            tokio::select! {
                outcome = node.initiate_handshake() => {
                    tracing::info!(
                        status = %outcome.status,
                        attempts = outcome.attempts,
                        "startup handshake finished"
                    );
                }
                _ = handshake_rx.changed() => {
                    tracing::debug!("startup handshake abandoned on shutdown");
                }
            }
        }));
    }

    tracing::info!(
        api_port,
        peer_url = %service_config.peer_url,
        user = %state.node().user(),
        "node running"
    );

    let handle = ShutdownHandle {
        graceful_waiter,
        handles,
        shutdown_tx,
    };

    (state, handle)
}

/// Run a node until SIGINT/SIGTERM: logging, event drain, API server and the startup
/// handshake. Use for the CLI binary.
pub async fn spawn_service(service_config: &ServiceConfig) {
    let _guards = init_logging(service_config);
    let (_, handle) = start_service(service_config).await;
    handle.wait().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::protocol::EventSink;
    use time::OffsetDateTime;

    #[tokio::test]
    async fn test_drain_stops_when_senders_are_gone() {
        let (sink, rx) = ChannelSink::new();
        let (_tx, shutdown_rx) = watch::channel(());

        sink.emit(ChatEvent::message(
            "hi",
            Direction::Sent,
            "alice",
            OffsetDateTime::now_utc(),
        ));
        sink.emit(ChatEvent::error("hi again", "timed out"));
        drop(sink);

        assert_eq!(drain_events(rx, shutdown_rx).await, 2);
    }

    #[tokio::test]
    async fn test_drain_stops_on_shutdown() {
        let (sink, rx) = ChannelSink::new();
        let (tx, shutdown_rx) = watch::channel(());

        let drain = tokio::spawn(drain_events(rx, shutdown_rx));
        tx.send(()).unwrap();

        assert_eq!(drain.await.unwrap(), 0);
        drop(sink);
    }
}
