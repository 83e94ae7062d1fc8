//! Process termination hooks
//!
//! Buffered writers keep entries in memory; these helpers make sure a final
//! flush happens when the process is asked to stop.

use crate::core::{Logger, LoggerError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

/// Wait for Ctrl-C, or SIGTERM on unix
pub async fn termination_signal() {
    #[cfg(unix)]
    {
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = ctrl_c() => {}
                }
            }
            Err(e) => {
                eprintln!("[LOGGER WARNING] Cannot watch SIGTERM: {}", e);
                ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    ctrl_c().await;
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("[LOGGER WARNING] Cannot watch Ctrl-C: {}", e);
        // Never resolve rather than report a termination that did not happen
        std::future::pending::<()>().await;
    }
}

/// Flush `logger`, giving up after `timeout`
pub async fn flush_with_timeout(logger: &Logger, timeout: Duration) -> Result<()> {
    match tokio::time::timeout(timeout, logger.flush()).await {
        Ok(result) => result,
        Err(_) => Err(LoggerError::other(format!(
            "Flush did not finish within {:?}",
            timeout
        ))),
    }
}

/// Spawn a task that flushes `logger` once a termination signal arrives.
///
/// The task finishes after the flush; the caller decides when to exit.
pub fn flush_on_termination(logger: Arc<Logger>) -> JoinHandle<()> {
    tokio::spawn(async move {
        termination_signal().await;
        if let Err(e) = logger.flush().await {
            eprintln!("[LOGGER ERROR] Final flush failed: {}", e);
        }
    })
}
