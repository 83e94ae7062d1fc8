//! Explicit process-wide logger handle
//!
//! Instead of a module-level global, applications construct one
//! [`LoggerRegistry`] and pass clones of it to whoever needs to log. Until
//! [`LoggerRegistry::init`] is called, it hands out a shared no-op logger.

use crate::core::{LogSource, Logger, Result};
use crate::writers::{NetworkConfig, NetworkWriter, Transport};
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Clone)]
pub struct LoggerRegistry {
    current: Arc<RwLock<Option<Arc<Logger>>>>,
    /// Handed out until a logger is installed
    fallback: Arc<Logger>,
}

impl Default for LoggerRegistry {
    fn default() -> Self {
        Self {
            current: Arc::new(RwLock::new(None)),
            fallback: Arc::new(Logger::noop()),
        }
    }
}

impl LoggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `logger`, returning the one it replaces
    pub fn init(&self, logger: Logger) -> Option<Arc<Logger>> {
        self.current.write().replace(Arc::new(logger))
    }

    pub fn is_initialized(&self) -> bool {
        self.current.read().is_some()
    }

    /// The installed logger, or the no-op logger before `init`
    pub fn logger(&self) -> Arc<Logger> {
        match *self.current.read() {
            Some(ref logger) => Arc::clone(logger),
            None => Arc::clone(&self.fallback),
        }
    }

    /// Flush and uninstall the current logger
    pub async fn teardown(&self) -> Result<()> {
        let previous = self.current.write().take();
        match previous {
            Some(logger) => logger.flush().await,
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for LoggerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerRegistry")
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

/// Logger for browser-origin telemetry: source `client`, batched network
/// delivery over HTTP
#[cfg(feature = "network")]
pub fn client_logger(config: NetworkConfig) -> Result<Logger> {
    Ok(Logger::builder()
        .source(LogSource::Client)
        .writer(NetworkWriter::new(config)?)
        .build())
}

/// Like [`client_logger`] with a caller-supplied transport
pub fn client_logger_with_transport(
    config: NetworkConfig,
    transport: Arc<dyn Transport>,
) -> Result<Logger> {
    Ok(Logger::builder()
        .source(LogSource::Client)
        .writer(NetworkWriter::with_transport(config, transport)?)
        .build())
}
