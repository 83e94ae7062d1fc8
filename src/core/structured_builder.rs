//! Fluent construction of a single log entry
//!
//! Collects message, fields, an error and a duration before handing them to
//! the logger in one call.

use super::log_entry::{keys, ErrorInfo};
use super::log_level::LogLevel;
use super::logger::Logger;
use super::metadata::{FieldValue, Metadata};

/// Builder for one structured log entry
///
/// # Example
///
/// ```
/// use structured_logger::prelude::*;
///
/// let memory = MemoryWriter::new();
/// let logger = Logger::builder().writer(memory.clone()).build();
///
/// logger.info_builder()
///     .message("Request processed")
///     .field("userId", "u-12345")
///     .field("status", 200)
///     .duration(42.5)
///     .log();
///
/// let entry = &memory.entries()[0];
/// assert_eq!(entry.user_id.as_deref(), Some("u-12345"));
/// assert_eq!(entry.duration, Some(42.5));
/// ```
pub struct EntryBuilder<'a> {
    logger: &'a Logger,
    level: LogLevel,
    message: String,
    metadata: Metadata,
}

impl<'a> EntryBuilder<'a> {
    pub fn new(logger: &'a Logger, level: LogLevel) -> Self {
        Self {
            logger,
            level,
            message: String::new(),
            metadata: Metadata::new(),
        }
    }

    #[must_use]
    pub fn message(mut self, msg: impl Into<String>) -> Self {
        self.message = msg.into();
        self
    }

    /// Add a structured field to the entry
    #[must_use]
    pub fn field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.metadata.insert(key, value);
        self
    }

    /// Add every field of `metadata`; existing keys are overwritten
    #[must_use]
    pub fn fields(mut self, metadata: Metadata) -> Self {
        self.metadata.merge(&metadata);
        self
    }

    #[must_use]
    pub fn error(mut self, error: ErrorInfo) -> Self {
        self.metadata.insert(keys::ERROR, error);
        self
    }

    /// Elapsed time in milliseconds
    #[must_use]
    pub fn duration(mut self, duration_ms: f64) -> Self {
        self.metadata.insert(keys::DURATION, duration_ms);
        self
    }

    /// Consume the builder and log the entry
    pub fn log(self) {
        self.logger
            .log_with_metadata(self.level, self.message, self.metadata);
    }
}

impl Logger {
    pub fn builder_at(&self, level: LogLevel) -> EntryBuilder<'_> {
        EntryBuilder::new(self, level)
    }

    pub fn debug_builder(&self) -> EntryBuilder<'_> {
        EntryBuilder::new(self, LogLevel::Debug)
    }

    /// Create an info-level entry builder
    ///
    /// ```
    /// use structured_logger::Logger;
    ///
    /// let logger = Logger::noop();
    /// logger.info_builder()
    ///     .message("Cache warmed")
    ///     .field("keys", 1024)
    ///     .log();
    /// ```
    pub fn info_builder(&self) -> EntryBuilder<'_> {
        EntryBuilder::new(self, LogLevel::Info)
    }

    pub fn warn_builder(&self) -> EntryBuilder<'_> {
        EntryBuilder::new(self, LogLevel::Warn)
    }

    pub fn error_builder(&self) -> EntryBuilder<'_> {
        EntryBuilder::new(self, LogLevel::Error)
    }

    pub fn fatal_builder(&self) -> EntryBuilder<'_> {
        EntryBuilder::new(self, LogLevel::Fatal)
    }
}
