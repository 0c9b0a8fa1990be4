// SPDX-FileCopyrightText: 2026 Litebook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signal handling.
//!
//! The handler only cancels a [`CancellationToken`]. The final sync runs on
//! a task spawned beforehand (see
//! [`LifecycleCoordinator::spawn_finalizer`](crate::LifecycleCoordinator::spawn_finalizer)),
//! never inside the handler itself.

#[cfg(unix)]
use tokio::signal::unix::SignalKind;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Installs handlers for SIGTERM and SIGINT.
///
/// Returns a token cancelled when either signal arrives. Cancelling the
/// token by other means also ends the handler task. SIGTERM is registered
/// before this returns, so a signal sent right after startup is not lost.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    #[cfg(unix)]
    let mut sigterm = match tokio::signal::unix::signal(SignalKind::terminate()) {
        Ok(stream) => Some(stream),
        Err(e) => {
            warn!(error = %e, "SIGTERM handler unavailable, listening for SIGINT only");
            None
        }
    };

    tokio::spawn(async move {
        #[cfg(unix)]
        let terminate = async {
            match sigterm.as_mut() {
                Some(stream) => {
                    stream.recv().await;
                }
                None => std::future::pending::<()>().await,
            }
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("received SIGINT, shutting down"),
            _ = terminate => info!("received SIGTERM, shutting down"),
            _ = trigger.cancelled() => return,
        }

        trigger.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}
