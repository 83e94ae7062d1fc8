//! Console writer implementation

use crate::core::{ConsoleStream, LogEntry, LoggerError, Result, TimestampFormat, Writer};
use async_trait::async_trait;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::io::Write as _;

/// Console writer options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Pretty-print metadata as JSON and include error stacks
    pub expand_metadata: bool,
    pub use_colors: bool,
    pub timestamp_format: TimestampFormat,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            expand_metadata: false,
            use_colors: true,
            timestamp_format: TimestampFormat::TimeOnly,
        }
    }
}

impl ConsoleConfig {
    #[must_use]
    pub fn with_expand_metadata(mut self, expand: bool) -> Self {
        self.expand_metadata = expand;
        self
    }

    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }
}

/// Human-readable output on stdout (debug, info) and stderr (warn and above)
pub struct ConsoleWriter {
    config: ConsoleConfig,
}

impl ConsoleWriter {
    pub fn new() -> Self {
        Self::with_config(ConsoleConfig::default())
    }

    pub fn with_config(config: ConsoleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    /// Render one entry as a console line (may span several lines when
    /// metadata is expanded)
    ///
    /// # Example
    ///
    /// ```
    /// use structured_logger::prelude::*;
    /// use structured_logger::writers::{ConsoleConfig, ConsoleWriter};
    ///
    /// let writer = ConsoleWriter::with_config(ConsoleConfig::default().with_colors(false));
    /// let entry = LogEntry::new(
    ///     LogLevel::Info,
    ///     LogSource::Server,
    ///     "ready",
    ///     Metadata::new().with_field("duration", 12),
    /// );
    /// assert!(writer.format_entry(&entry).ends_with("INFO  [server] ready (12ms)"));
    /// ```
    pub fn format_entry(&self, entry: &LogEntry) -> String {
        let timestamp = self.config.timestamp_format.format(&entry.timestamp);
        let level = format!("{:5}", entry.level.to_str().to_uppercase());
        let source = format!("[{}]", entry.source);

        let mut line = if self.config.use_colors {
            format!(
                "{} {} {} {}",
                timestamp.dimmed(),
                level.color(entry.level.color_code()).bold(),
                source.dimmed(),
                escape_message(&entry.message)
            )
        } else {
            format!(
                "{} {} {} {}",
                timestamp,
                level,
                source,
                escape_message(&entry.message)
            )
        };

        if let Some(duration) = entry.duration {
            line.push_str(&format!(" ({}ms)", duration));
        }

        if let Some(ref error) = entry.error {
            line.push_str(&format!("\n  {}", error));
            if self.config.expand_metadata {
                if let Some(ref stack) = error.stack {
                    line.push('\n');
                    line.push_str(stack);
                }
            }
        }

        if let Some(ref metadata) = entry.metadata {
            if self.config.expand_metadata {
                match serde_json::to_string_pretty(metadata) {
                    Ok(pretty) => {
                        line.push('\n');
                        line.push_str(&pretty);
                    }
                    Err(_) => {
                        line.push(' ');
                        line.push_str(&metadata.format_fields());
                    }
                }
            } else {
                line.push(' ');
                line.push_str(&metadata.format_fields());
            }
        }

        line
    }
}

impl Default for ConsoleWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Escape control characters so one entry cannot forge additional lines
fn escape_message(message: &str) -> String {
    message
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

#[async_trait]
impl Writer for ConsoleWriter {
    fn write(&self, entry: &LogEntry) -> Result<()> {
        let output = self.format_entry(entry);

        match entry.level.stream() {
            ConsoleStream::Stdout => writeln!(std::io::stdout().lock(), "{}", output)
                .map_err(|e| LoggerError::io_operation("writing to stdout", "console write failed", e)),
            ConsoleStream::Stderr => writeln!(std::io::stderr().lock(), "{}", output)
                .map_err(|e| LoggerError::io_operation("writing to stderr", "console write failed", e)),
        }
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ErrorInfo, LogLevel, LogSource, Metadata};

    fn plain(expand: bool) -> ConsoleWriter {
        ConsoleWriter::with_config(
            ConsoleConfig::default()
                .with_colors(false)
                .with_expand_metadata(expand),
        )
    }

    fn entry(message: &str, metadata: Metadata) -> LogEntry {
        LogEntry::new(LogLevel::Warn, LogSource::Database, message, metadata)
    }

    #[test]
    fn test_basic_line_layout() {
        let line = plain(false).format_entry(&entry("slow query", Metadata::new()));
        let parts: Vec<&str> = line.splitn(2, ' ').collect();

        assert_eq!(parts[0].len(), "10:30:45.123".len());
        assert_eq!(parts[1], "WARN  [database] slow query");
    }

    #[test]
    fn test_duration_suffix() {
        let e = entry("done", Metadata::new().with_field("duration", 12.5));
        assert!(plain(false).format_entry(&e).ends_with("done (12.5ms)"));
    }

    #[test]
    fn test_error_block_stack_only_when_expanded() {
        let error = ErrorInfo::new("IoError", "disk gone").with_stack("at write()");
        let e = entry("failed", Metadata::new().with_field("error", error));

        let compact = plain(false).format_entry(&e);
        assert!(compact.contains("\n  IoError: disk gone"));
        assert!(!compact.contains("at write()"));

        let expanded = plain(true).format_entry(&e);
        assert!(expanded.contains("at write()"));
    }

    #[test]
    fn test_metadata_compact_and_expanded() {
        let e = entry("with fields", Metadata::new().with_field("table", "users"));

        assert!(plain(false).format_entry(&e).ends_with("table=users"));

        let expanded = plain(true).format_entry(&e);
        assert!(expanded.contains("\n{\n  \"table\": \"users\"\n}"));
    }

    #[test]
    fn test_message_newlines_escaped() {
        let e = entry("line1\nFAKE ERROR line", Metadata::new());
        let line = plain(false).format_entry(&e);
        assert!(!line.contains('\n'));
        assert!(line.contains("line1\\nFAKE ERROR line"));
    }

    #[test]
    fn test_config_deserialization_defaults() {
        let config: ConsoleConfig =
            serde_json::from_str(r#"{"expand_metadata": true}"#).unwrap();
        assert!(config.expand_metadata);
        assert!(config.use_colors);
        assert_eq!(config.timestamp_format, TimestampFormat::TimeOnly);
    }
}
