//! Graceful shutdown for a long-running workflow invocation. A run that is
//! mid-flight when a shutdown signal arrives should let its in-progress
//! trades reach a terminal state rather than being killed outright, the
//! run-state store and the broker's open orders are the source of truth
//! either way, so an abrupt exit is safe but wasteful, not corrupting.

use tokio::signal;

/// A shutdown signal, raised once and never cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Shutdown;

/// Resolves the first time the process receives SIGINT (or, on Unix,
/// SIGTERM). Intended to be raced against an in-flight workflow future via
/// `tokio::select!`.
pub async fn wait_for_signal() -> Shutdown {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    Shutdown
}
