//! Integration tests for the structured logger
//!
//! These tests verify:
//! - Level filtering and call ordering across writers
//! - Field hoisting into top-level entry fields
//! - Network batching, retry ordering and queue bounds
//! - File rotation and retention on a real filesystem
//! - Timed spans and error pass-through
//! - Child logger isolation and writer fan-out failure handling

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use structured_logger::metadata;
use structured_logger::prelude::*;
use structured_logger::writers::{FileConfig, NetworkConfig, PostOutcome, Transport};
use tempfile::TempDir;

fn memory_logger(min_level: LogLevel) -> (Logger, MemoryWriter) {
    let memory = MemoryWriter::new();
    let logger = Logger::builder()
        .min_level(min_level)
        .writer(memory.clone())
        .build();
    (logger, memory)
}

fn log_every_level(logger: &Logger) {
    logger.debug("debug");
    logger.info("info");
    logger.warn("warn");
    logger.error("error");
    logger.fatal("fatal");
}

#[test]
fn test_level_filtering_for_every_threshold() {
    for threshold in LogLevel::ALL {
        let (logger, memory) = memory_logger(threshold);
        log_every_level(&logger);

        let expected: Vec<LogLevel> = LogLevel::ALL
            .iter()
            .copied()
            .filter(|level| level.rank() >= threshold.rank())
            .collect();
        assert_eq!(memory.levels(), expected, "threshold {}", threshold);
    }
}

#[test]
fn test_end_to_end_warn_threshold() {
    let (logger, memory) = memory_logger(LogLevel::Warn);

    logger.debug("x");
    logger.info("y");
    logger.warn("z");
    logger.error("w");

    assert_eq!(memory.len(), 2);
    assert_eq!(memory.messages(), vec!["z", "w"]);
    assert_eq!(memory.levels(), vec![LogLevel::Warn, LogLevel::Error]);
}

#[test]
fn test_duration_hoisted_out_of_metadata() {
    let (logger, memory) = memory_logger(LogLevel::Debug);

    logger.info_with_metadata("done", metadata! { "duration" => 42, "other" => "x" });

    let entry = &memory.entries()[0];
    assert_eq!(entry.duration, Some(42.0));
    assert_eq!(entry.metadata, Some(metadata! { "other" => "x" }));
}

#[test]
fn test_hoisting_can_empty_metadata() {
    let (logger, memory) = memory_logger(LogLevel::Debug);

    logger.info_with_metadata("who", metadata! { "userId" => "u1" });

    let entry = &memory.entries()[0];
    assert_eq!(entry.user_id.as_deref(), Some("u1"));
    assert!(entry.metadata.is_none());

    let json = entry.to_json_line().unwrap();
    assert!(json.contains("\"userId\":\"u1\""));
    assert!(!json.contains("metadata"));
}

#[test]
fn test_child_metadata_does_not_reach_parent() {
    let (parent, memory) = memory_logger(LogLevel::Debug);

    let child = parent.child(metadata! { "a" => 1 });
    child.info("from child");
    parent.info("from parent");

    let entries = memory.entries();
    assert_eq!(entries[0].metadata_value("a"), Some(&FieldValue::Int(1)));
    assert!(entries[1].metadata_value("a").is_none());
    assert!(parent.default_metadata().is_empty());
}

#[test]
fn test_children_share_writers_and_metrics() {
    let (parent, memory) = memory_logger(LogLevel::Info);
    let child = parent.child(Metadata::new());
    let grandchild = child.with_correlation_id("c-1");

    grandchild.debug("filtered");
    grandchild.info("kept");

    assert_eq!(memory.messages(), vec!["kept"]);
    assert_eq!(parent.metrics().delivered_count(), 1);
    assert_eq!(parent.metrics().filtered_count(), 1);
}

// ============================================================================
// Fan-out failures
// ============================================================================

struct BrokenWriter;

#[async_trait]
impl Writer for BrokenWriter {
    fn write(&self, _entry: &LogEntry) -> Result<()> {
        Err(LoggerError::writer("broken", "always fails"))
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "broken"
    }
}

#[test]
fn test_isolated_fanout_keeps_later_writers_fed() {
    let memory = MemoryWriter::new();
    let logger = Logger::builder()
        .writer(BrokenWriter)
        .writer(memory.clone())
        .build();

    logger.warn("still arrives");

    assert_eq!(memory.messages(), vec!["still arrives"]);
    assert_eq!(logger.metrics().failed_count(), 1);
}

/// `try_log` keeps the unguarded behaviour: the first failure stops the
/// fan-out and reaches the caller.
#[test]
fn test_try_log_propagates_first_writer_failure() {
    let memory = MemoryWriter::new();
    let logger = Logger::builder()
        .writer(BrokenWriter)
        .writer(memory.clone())
        .build();

    let result = logger.try_log(LogLevel::Warn, "lost", Metadata::new());

    assert!(matches!(result, Err(LoggerError::WriterFailed { .. })));
    assert!(memory.is_empty());
}

// ============================================================================
// Network writer
// ============================================================================

#[derive(Default)]
struct RecordingTransport {
    bodies: Mutex<Vec<serde_json::Value>>,
    outcomes: Mutex<VecDeque<PostOutcome>>,
}

impl RecordingTransport {
    fn sizes(&self) -> Vec<usize> {
        self.bodies
            .lock()
            .iter()
            .map(|body| body.as_array().map(Vec::len).unwrap_or(0))
            .collect()
    }

    fn messages(&self, post: usize) -> Vec<String> {
        self.bodies.lock()[post]
            .as_array()
            .unwrap()
            .iter()
            .map(|entry| entry["message"].as_str().unwrap().to_string())
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn post(&self, _endpoint: &str, body: String) -> Result<PostOutcome> {
        self.bodies.lock().push(serde_json::from_str(&body)?);
        Ok(self.outcomes.lock().pop_front().unwrap_or(PostOutcome::Delivered))
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

#[tokio::test]
async fn test_network_batch_trigger() {
    let transport = Arc::new(RecordingTransport::default());
    let writer = NetworkWriter::with_transport(
        NetworkConfig::new("http://collector/logs").with_batch_size(2),
        transport.clone(),
    )
    .unwrap();
    let logger = Logger::builder()
        .source(LogSource::Client)
        .shared_writer(Arc::new(writer))
        .build();

    logger.info("one");
    settle().await;
    assert!(transport.sizes().is_empty());

    logger.info("two");
    settle().await;
    assert_eq!(transport.sizes(), vec![2]);

    let body = transport.bodies.lock()[0].clone();
    assert_eq!(body[0]["source"], "client");
    assert_eq!(body[0]["level"], "info");
    assert!(body[0]["id"].is_string());
    assert!(body[0]["timestamp"].is_string());
}

#[tokio::test]
async fn test_network_retry_preserves_order() {
    let transport = Arc::new(RecordingTransport::default());
    transport
        .outcomes
        .lock()
        .push_back(PostOutcome::Rejected(502));
    let writer = NetworkWriter::with_transport(
        NetworkConfig::new("http://collector/logs").with_batch_size(2),
        transport.clone(),
    )
    .unwrap();
    let logger = Logger::builder().writer(writer.clone()).build();

    logger.info("first");
    logger.info("second");
    settle().await;
    assert_eq!(writer.queued_len(), 2);

    logger.info("third");
    logger.flush().await.unwrap();
    settle().await;

    assert_eq!(transport.sizes(), vec![2, 3]);
    assert_eq!(transport.messages(1), vec!["first", "second", "third"]);
    assert_eq!(writer.queued_len(), 0);
}

#[tokio::test]
async fn test_network_queue_never_exceeds_bound() {
    let transport = Arc::new(RecordingTransport::default());
    transport
        .outcomes
        .lock()
        .extend(std::iter::repeat(PostOutcome::Rejected(503)).take(10));
    let writer = NetworkWriter::with_transport(
        NetworkConfig::new("http://collector/logs")
            .with_batch_size(2)
            .with_max_queue_size(4),
        transport.clone(),
    )
    .unwrap();
    let logger = Logger::builder().writer(writer.clone()).build();

    for i in 0..8 {
        logger.info(format!("entry {}", i));
        settle().await;
        assert!(writer.queued_len() <= 4);
    }
    assert!(writer.metrics().dropped_count() > 0);
}

// ============================================================================
// File writer
// ============================================================================

fn rotated_names(dir: &Path, active: &str) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name != active)
        .collect()
}

#[test]
fn test_file_rotation_and_retention() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("service.log");
    let max_size = 512;
    let writer = FileWriter::new(
        FileConfig::new(&path)
            .with_max_size(max_size)
            .with_keep_rotated(3),
    )
    .unwrap();
    let logger = Logger::builder().writer(writer).build();

    while fs::metadata(&path).map(|m| m.len()).unwrap_or(0) < max_size {
        logger.info("payload payload payload");
    }
    assert!(rotated_names(temp_dir.path(), "service.log").is_empty());

    logger.info("fresh file");
    let rotated = rotated_names(temp_dir.path(), "service.log");
    assert_eq!(rotated.len(), 1);
    assert!(rotated[0].starts_with("service.") && rotated[0].ends_with(".log"));
    assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 1);

    for _ in 0..200 {
        logger.info("payload payload payload");
    }
    assert!(rotated_names(temp_dir.path(), "service.log").len() <= 3);
}

#[test]
fn test_file_lines_are_valid_entries() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("entries.log");
    let logger = Logger::builder()
        .source(LogSource::Database)
        .writer(FileWriter::new(FileConfig::new(&path)).unwrap())
        .build();

    logger.error_with_metadata(
        "User login\nERROR fake line",
        metadata! {
            "error" => ErrorInfo::new("AuthError", "bad password"),
            "requestId" => "r-1",
        },
    );

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 1, "one entry must stay on one line");

    let entry: LogEntry = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(entry.message, "User login\nERROR fake line");
    assert_eq!(entry.request_id.as_deref(), Some("r-1"));
    assert_eq!(entry.error.unwrap().name, "AuthError");
    assert_eq!(entry.source, LogSource::Database);
}

// ============================================================================
// Timed spans
// ============================================================================

#[derive(Debug, PartialEq)]
struct UpstreamError(&'static str);

impl std::fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "upstream: {}", self.0)
    }
}

#[tokio::test]
async fn test_timed_success() {
    let (logger, memory) = memory_logger(LogLevel::Debug);
    let started = std::time::Instant::now();

    let result = logger
        .timed("sync_accounts", async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            Ok::<_, UpstreamError>(12)
        })
        .await;
    let outer_ms = started.elapsed().as_secs_f64() * 1000.0;

    assert_eq!(result, Ok(12));
    let entries = memory.entries();
    assert_eq!(entries.len(), 2);
    let duration = entries[1].duration.unwrap();
    assert!(duration >= 30.0);
    assert!(duration <= outer_ms);
}

#[tokio::test]
async fn test_timed_failure_rethrows_original() {
    let (logger, memory) = memory_logger(LogLevel::Debug);

    let result: std::result::Result<(), UpstreamError> = logger
        .timed("sync_accounts", async { Err(UpstreamError("timeout")) })
        .await;

    assert_eq!(result, Err(UpstreamError("timeout")));
    let entries = memory.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].message, "Entering sync_accounts");
    assert_eq!(entries[1].message, "Error in sync_accounts");
    assert_eq!(entries[1].error.as_ref().unwrap().message, "upstream: timeout");
}

// ============================================================================
// Registry and platform logger
// ============================================================================

#[tokio::test]
async fn test_registry_with_platform_logger() {
    let registry = LoggerRegistry::new();
    let memory = MemoryWriter::new();
    registry.init(
        Logger::builder()
            .field("service", "edge-api")
            .writer(memory.clone())
            .build(),
    );

    let base = registry.logger();
    let platform = PlatformLogger::with_ids(
        &base,
        structured_logger::platform::PlatformContext::default(),
        "corr-1",
        "req-1",
    );
    platform.log_request(&structured_logger::platform::RequestInfo::new("GET", "/health"));
    platform.log_response(200, 4.0, Metadata::new());
    registry.teardown().await.unwrap();

    for entry in memory.entries() {
        assert_eq!(entry.source, LogSource::Edge);
        assert_eq!(entry.correlation_id.as_deref(), Some("corr-1"));
        assert_eq!(entry.request_id.as_deref(), Some("req-1"));
        assert_eq!(entry.metadata_value("service"), Some(&FieldValue::from("edge-api")));
    }
    assert_eq!(memory.len(), 2);
}

#[test]
fn test_config_driven_logger() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("configured.log");
    let config = LoggerConfig {
        min_level: LogLevel::Info,
        console: None,
        file: Some(FileConfig::new(&path)),
        ..LoggerConfig::default()
    };

    let logger = config.build().unwrap();
    logger.debug("skipped");
    logger.info("written");

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 1);
    assert!(content.contains("\"written\""));
}
