//! Main logger implementation

use super::{
    error::Result,
    log_entry::LogEntry,
    log_level::{LogLevel, LogSource},
    metadata::{FieldValue, Metadata},
    metrics::DeliveryMetrics,
    writer::{NoopWriter, Writer},
};
use futures::future::join_all;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// How a logger reacts when one of its writers fails during fan-out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FanoutPolicy {
    /// Each writer is invoked on its own; errors and panics are reported on
    /// stderr and counted, and the remaining writers still get the entry.
    #[default]
    Isolate,

    /// Stop at the first failing writer; later writers miss that entry.
    FailFast,
}

/// Structured logger with a level threshold, default metadata, a mutable
/// context map and an ordered list of writers.
///
/// Every accepted entry is built from `context`, then `default_metadata`,
/// then the call-site metadata (later sources win), and handed to every
/// writer in order.
///
/// # Example
///
/// ```
/// use structured_logger::prelude::*;
///
/// let memory = MemoryWriter::new();
/// let logger = Logger::builder()
///     .source(LogSource::Server)
///     .min_level(LogLevel::Warn)
///     .writer(memory.clone())
///     .build();
///
/// logger.info("ignored");
/// logger.warn("disk almost full");
///
/// assert_eq!(memory.messages(), vec!["disk almost full"]);
/// ```
pub struct Logger {
    source: LogSource,
    writers: Arc<[Arc<dyn Writer>]>,
    min_level: LogLevel,
    default_metadata: Metadata,
    context: RwLock<Metadata>,
    fanout: FanoutPolicy,
    metrics: Arc<DeliveryMetrics>,
}

impl Logger {
    /// Create a builder for Logger
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// A logger that accepts every call and records nothing
    #[must_use]
    pub fn noop() -> Self {
        Logger::builder().writer(NoopWriter).build()
    }

    pub fn source(&self) -> LogSource {
        self.source
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    pub fn default_metadata(&self) -> &Metadata {
        &self.default_metadata
    }

    /// Snapshot of the current context map
    pub fn context(&self) -> Metadata {
        self.context.read().clone()
    }

    pub fn fanout(&self) -> FanoutPolicy {
        self.fanout
    }

    pub fn writers(&self) -> &[Arc<dyn Writer>] {
        &self.writers
    }

    /// Delivery counters shared by this logger and its children
    pub fn metrics(&self) -> &DeliveryMetrics {
        &self.metrics
    }

    #[inline]
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.log_with_metadata(level, message, Metadata::new());
    }

    /// Log with call-site metadata, honouring the configured fan-out policy
    pub fn log_with_metadata(&self, level: LogLevel, message: impl Into<String>, metadata: Metadata) {
        if !self.is_enabled(level) {
            self.metrics.record_filtered();
            return;
        }

        let entry = self.build_entry(level, message.into(), metadata);
        match self.fanout {
            FanoutPolicy::Isolate => self.dispatch_isolated(&entry),
            FanoutPolicy::FailFast => {
                if let Err(e) = self.dispatch_fail_fast(&entry) {
                    eprintln!("[LOGGER ERROR] Fan-out aborted: {}", e);
                }
            }
        }
    }

    /// Log and surface the first writer failure to the caller.
    ///
    /// Writers after the failing one do not receive the entry. Filtered
    /// calls return `Ok(())` without touching any writer.
    pub fn try_log(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        metadata: Metadata,
    ) -> Result<()> {
        if !self.is_enabled(level) {
            self.metrics.record_filtered();
            return Ok(());
        }

        let entry = self.build_entry(level, message.into(), metadata);
        self.dispatch_fail_fast(&entry)
    }

    fn build_entry(&self, level: LogLevel, message: String, metadata: Metadata) -> LogEntry {
        let mut merged = self.context.read().clone();
        merged.merge(&self.default_metadata);
        merged.merge(&metadata);
        LogEntry::new(level, self.source, message, merged)
    }

    /// Hand the entry to every writer, isolating each one from the others
    fn dispatch_isolated(&self, entry: &LogEntry) {
        let mut has_error = false;

        for (idx, writer) in self.writers.iter().enumerate() {
            let write_result =
                std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| writer.write(entry)));

            match write_result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    eprintln!(
                        "[LOGGER ERROR] Writer #{} ({}) failed: {}",
                        idx,
                        writer.name(),
                        e
                    );
                    self.metrics.record_failed();
                    has_error = true;
                }
                Err(panic_info) => {
                    eprintln!(
                        "[LOGGER CRITICAL] Writer #{} ({}) panicked: {}. \
                         Other writers continue to function.",
                        idx,
                        writer.name(),
                        panic_message(panic_info.as_ref())
                    );
                    self.metrics.record_failed();
                    has_error = true;
                }
            }
        }

        if !has_error {
            self.metrics.record_delivered();
        }
    }

    fn dispatch_fail_fast(&self, entry: &LogEntry) -> Result<()> {
        for writer in self.writers.iter() {
            if let Err(e) = writer.write(entry) {
                self.metrics.record_failed();
                return Err(e);
            }
        }
        self.metrics.record_delivered();
        Ok(())
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    #[inline]
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    #[inline]
    pub fn fatal(&self, message: impl Into<String>) {
        self.log(LogLevel::Fatal, message);
    }

    #[inline]
    pub fn debug_with_metadata(&self, message: impl Into<String>, metadata: Metadata) {
        self.log_with_metadata(LogLevel::Debug, message, metadata);
    }

    #[inline]
    pub fn info_with_metadata(&self, message: impl Into<String>, metadata: Metadata) {
        self.log_with_metadata(LogLevel::Info, message, metadata);
    }

    #[inline]
    pub fn warn_with_metadata(&self, message: impl Into<String>, metadata: Metadata) {
        self.log_with_metadata(LogLevel::Warn, message, metadata);
    }

    #[inline]
    pub fn error_with_metadata(&self, message: impl Into<String>, metadata: Metadata) {
        self.log_with_metadata(LogLevel::Error, message, metadata);
    }

    #[inline]
    pub fn fatal_with_metadata(&self, message: impl Into<String>, metadata: Metadata) {
        self.log_with_metadata(LogLevel::Fatal, message, metadata);
    }

    /// Derive a logger sharing this one's writers, level and metrics.
    ///
    /// The child's default metadata is this logger's defaults overlaid with
    /// `metadata`. Its context starts as a copy of this logger's context and
    /// is independent afterwards.
    #[must_use]
    pub fn child(&self, metadata: Metadata) -> Logger {
        self.child_with_source(self.source, metadata)
    }

    /// Like [`Logger::child`], but entries carry a different source
    #[must_use]
    pub fn child_with_source(&self, source: LogSource, metadata: Metadata) -> Logger {
        Logger {
            source,
            writers: Arc::clone(&self.writers),
            min_level: self.min_level,
            default_metadata: self.default_metadata.merged(&metadata),
            context: RwLock::new(self.context.read().clone()),
            fanout: self.fanout,
            metrics: Arc::clone(&self.metrics),
        }
    }

    /// Merge `metadata` into this logger's context for all subsequent calls
    pub fn set_context(&self, metadata: Metadata) {
        self.context.write().merge(&metadata);
    }

    pub fn clear_context(&self) {
        self.context.write().clear();
    }

    /// Child logger whose entries carry `correlation_id`
    #[must_use]
    pub fn with_correlation_id(&self, correlation_id: impl Into<String>) -> Logger {
        self.child(Metadata::new().with_field(
            super::log_entry::keys::CORRELATION_ID,
            FieldValue::String(correlation_id.into()),
        ))
    }

    /// Flush every writer concurrently and wait for all of them to settle.
    ///
    /// Returns the first error once every writer has finished.
    pub async fn flush(&self) -> Result<()> {
        let results = join_all(self.writers.iter().map(|writer| writer.flush())).await;
        results.into_iter().collect::<Result<Vec<()>>>().map(|_| ())
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("source", &self.source)
            .field("min_level", &self.min_level)
            .field(
                "writers",
                &self.writers.iter().map(|w| w.name()).collect::<Vec<_>>(),
            )
            .field("default_metadata", &self.default_metadata)
            .field("fanout", &self.fanout)
            .finish()
    }
}

fn panic_message(panic_info: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use structured_logger::prelude::*;
///
/// let logger = Logger::builder()
///     .source(LogSource::Auth)
///     .min_level(LogLevel::Info)
///     .field("service", "identity")
///     .writer(ConsoleWriter::new())
///     .build();
/// assert_eq!(logger.min_level(), LogLevel::Info);
/// ```
pub struct LoggerBuilder {
    source: LogSource,
    min_level: LogLevel,
    default_metadata: Metadata,
    writers: Vec<Arc<dyn Writer>>,
    fanout: FanoutPolicy,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            source: LogSource::default(),
            min_level: LogLevel::Debug,
            default_metadata: Metadata::new(),
            writers: Vec::new(),
            fanout: FanoutPolicy::default(),
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn source(mut self, source: LogSource) -> Self {
        self.source = source;
        self
    }

    /// Set minimum log level
    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Replace the default metadata merged into every entry
    #[must_use = "builder methods return a new value"]
    pub fn default_metadata(mut self, metadata: Metadata) -> Self {
        self.default_metadata = metadata;
        self
    }

    /// Add one default metadata field
    #[must_use = "builder methods return a new value"]
    pub fn field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.default_metadata.insert(key, value);
        self
    }

    /// Append a writer; writers receive entries in the order they were added
    #[must_use = "builder methods return a new value"]
    pub fn writer<W: Writer + 'static>(mut self, writer: W) -> Self {
        self.writers.push(Arc::new(writer));
        self
    }

    /// Append a writer that is also held elsewhere
    #[must_use = "builder methods return a new value"]
    pub fn shared_writer(mut self, writer: Arc<dyn Writer>) -> Self {
        self.writers.push(writer);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn fanout(mut self, policy: FanoutPolicy) -> Self {
        self.fanout = policy;
        self
    }

    /// Build the Logger
    pub fn build(self) -> Logger {
        Logger {
            source: self.source,
            writers: self.writers.into(),
            min_level: self.min_level,
            default_metadata: self.default_metadata,
            context: RwLock::new(Metadata::new()),
            fanout: self.fanout,
            metrics: Arc::new(DeliveryMetrics::new()),
        }
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
