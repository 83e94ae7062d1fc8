//! # Structured Logger
//!
//! A structured logging core: leveled, metadata-rich entries fanned out to
//! pluggable writers.
//!
//! ## Features
//!
//! - **Structured entries**: well-known fields (`correlationId`, `requestId`,
//!   `userId`, `duration`, `error`) are hoisted out of metadata
//! - **Writers**: console, rotating JSON-lines file, batched network and
//!   in-memory
//! - **Context**: default metadata, per-logger context and child loggers
//! - **Domain helpers**: timed spans, HTTP, database, auth, build and git events
//! - **Edge requests**: request-scoped platform logger with query sanitization
//!
//! ## Example
//!
//! ```
//! use structured_logger::prelude::*;
//!
//! let memory = MemoryWriter::new();
//! let logger = Logger::builder()
//!     .source(LogSource::Server)
//!     .min_level(LogLevel::Info)
//!     .field("service", "billing")
//!     .writer(memory.clone())
//!     .build();
//!
//! let request_logger = logger.with_correlation_id("req-7f3a");
//! request_logger.info_with_metadata(
//!     "Invoice created",
//!     Metadata::new().with_field("duration", 18.2).with_field("invoice", 991),
//! );
//!
//! let entry = &memory.entries()[0];
//! assert_eq!(entry.correlation_id.as_deref(), Some("req-7f3a"));
//! assert_eq!(entry.duration, Some(18.2));
//! ```

pub mod config;
pub mod core;
pub mod lifecycle;
pub mod macros;
pub mod operations;
pub mod platform;
pub mod registry;
pub mod writers;

pub mod prelude {
    pub use crate::config::LoggerConfig;
    pub use crate::core::{
        keys, DeliveryMetrics, EntryBuilder, ErrorInfo, FanoutPolicy, FieldValue, LogEntry,
        LogLevel, LogSource, Logger, LoggerBuilder, LoggerError, Metadata, Result,
        TimestampFormat, Writer,
    };
    pub use crate::platform::PlatformLogger;
    pub use crate::registry::LoggerRegistry;
    pub use crate::writers::{ConsoleWriter, FileWriter, MemoryWriter, NetworkWriter};
}

pub use crate::config::LoggerConfig;
pub use crate::core::{
    keys, ConsoleStream, DeliveryMetrics, EntryBuilder, ErrorInfo, FanoutPolicy, FieldValue,
    LogEntry, LogLevel, LogSource, Logger, LoggerBuilder, LoggerError, Metadata, NoopWriter,
    Result, TimestampFormat, Writer,
};
pub use crate::platform::PlatformLogger;
pub use crate::registry::LoggerRegistry;
pub use crate::writers::{ConsoleWriter, FileWriter, MemoryWriter, NetworkWriter};
