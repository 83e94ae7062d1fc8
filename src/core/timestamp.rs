//! Timestamp formatting utilities
//!
//! Provides the timestamp renderings used by the console writer and the
//! filesystem-safe stamp used in rotated file names.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// strftime pattern of the stamp embedded in rotated file names
pub const ROTATION_STAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";

/// Length of a rendered rotation stamp (`2025-01-08T10-30-45`)
pub const ROTATION_STAMP_LEN: usize = 19;

/// Timestamp format options for human-readable output
///
/// # Examples
///
/// ```
/// use structured_logger::TimestampFormat;
/// use chrono::Utc;
///
/// let timestamp = TimestampFormat::Iso8601.format(&Utc::now());
/// assert!(timestamp.ends_with('Z'));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// ISO 8601 with milliseconds: `2025-01-08T10:30:45.123Z`
    #[default]
    Iso8601,

    /// ISO 8601 with microseconds: `2025-01-08T10:30:45.123456Z`
    Iso8601Micros,

    /// RFC 3339 format: `2025-01-08T10:30:45+00:00`
    Rfc3339,

    /// Wall-clock time only: `10:30:45.123`
    TimeOnly,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// Custom strftime format
    Custom(String),
}

impl TimestampFormat {
    /// Format a `DateTime<Utc>` according to this format
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        match self {
            TimestampFormat::Iso8601 => datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            TimestampFormat::Iso8601Micros => datetime.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
            TimestampFormat::Rfc3339 => datetime.to_rfc3339(),
            TimestampFormat::TimeOnly => datetime.format("%H:%M:%S%.3f").to_string(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::Custom(format_str) => datetime.format(format_str).to_string(),
        }
    }
}

/// Render the filesystem-safe UTC stamp used for rotated files
pub fn rotation_stamp(datetime: &DateTime<Utc>) -> String {
    datetime.format(ROTATION_STAMP_FORMAT).to_string()
}

/// Check whether `candidate` starts with a rotation stamp
pub fn starts_with_rotation_stamp(candidate: &str) -> bool {
    candidate
        .get(..ROTATION_STAMP_LEN)
        .map(|stamp| NaiveDateTime::parse_from_str(stamp, ROTATION_STAMP_FORMAT).is_ok())
        .unwrap_or(false)
}
