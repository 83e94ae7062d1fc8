//! Core logger types and traits

pub mod error;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod metadata;
pub mod metrics;
pub mod structured_builder;
pub mod timestamp;
pub mod writer;

pub use error::{LoggerError, Result};
pub use log_entry::{keys, ErrorInfo, LogEntry};
pub use log_level::{ConsoleStream, LogLevel, LogSource};
pub use logger::{FanoutPolicy, Logger, LoggerBuilder};
pub use metadata::{FieldValue, Metadata};
pub use metrics::DeliveryMetrics;
pub use structured_builder::EntryBuilder;
pub use timestamp::TimestampFormat;
pub use writer::{NoopWriter, Writer};
