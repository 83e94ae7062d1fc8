//! Writer trait for log output destinations

use super::{error::Result, log_entry::LogEntry};
use async_trait::async_trait;

/// A sink for log entries.
///
/// `write` is synchronous and is called once per accepted entry, in call
/// order. `flush` pushes out anything the writer still holds; writers that
/// hold nothing make it a no-op. Writers take `&self` so a single instance
/// can be shared by a logger and all of its children.
///
/// # Example
///
/// ```
/// use structured_logger::{LogEntry, Result, Writer};
/// use async_trait::async_trait;
///
/// struct CountingWriter(std::sync::atomic::AtomicUsize);
///
/// #[async_trait]
/// impl Writer for CountingWriter {
///     fn write(&self, _entry: &LogEntry) -> Result<()> {
///         self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
///         Ok(())
///     }
///
///     async fn flush(&self) -> Result<()> {
///         Ok(())
///     }
///
///     fn name(&self) -> &str {
///         "counting"
///     }
/// }
/// ```
#[async_trait]
pub trait Writer: Send + Sync {
    fn write(&self, entry: &LogEntry) -> Result<()>;
    async fn flush(&self) -> Result<()>;
    fn name(&self) -> &str;
}

/// Writer that discards everything; backs uninitialised logger handles.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopWriter;

#[async_trait]
impl Writer for NoopWriter {
    fn write(&self, _entry: &LogEntry) -> Result<()> {
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "noop"
    }
}
