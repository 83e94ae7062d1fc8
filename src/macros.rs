//! Logging macros for ergonomic log message formatting.
//!
//! These macros provide a convenient interface for logging with automatic
//! string formatting, similar to `println!` and `format!`, plus a literal
//! syntax for metadata maps.
//!
//! # Examples
//!
//! ```
//! use structured_logger::prelude::*;
//! use structured_logger::{info, metadata};
//!
//! let logger = Logger::noop();
//!
//! info!(logger, "Server started");
//!
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//!
//! logger.info_with_metadata("Session opened", metadata! {
//!     "userId" => "u-42",
//!     "remember" => true,
//! });
//! ```

/// Build a [`Metadata`](crate::Metadata) map from `key => value` pairs.
///
/// ```
/// use structured_logger::{metadata, FieldValue};
///
/// let fields = metadata! { "attempt" => 3, "host" => "db-1" };
/// assert_eq!(fields.get("attempt"), Some(&FieldValue::Int(3)));
/// assert!(metadata! {}.is_empty());
/// ```
#[macro_export]
macro_rules! metadata {
    () => {
        $crate::Metadata::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut fields = $crate::Metadata::new();
        $(
            fields.insert($key, $value);
        )+
        fields
    }};
}

/// Log a message with automatic formatting.
///
/// ```
/// # use structured_logger::prelude::*;
/// # let logger = Logger::noop();
/// use structured_logger::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, format!($($arg)+))
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// ```
/// # use structured_logger::prelude::*;
/// # let logger = Logger::noop();
/// use structured_logger::warn;
/// warn!(logger, "Retry attempt {} of {}", 3, 5);
/// ```
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a fatal-level message.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}
