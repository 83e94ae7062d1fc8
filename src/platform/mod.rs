//! Request-scoped logging for edge execution
//!
//! A [`PlatformLogger`] wraps a child of an existing [`Logger`] for one
//! inbound request or scheduled invocation. Every entry carries a
//! correlation id, a request id, geolocation hints and the runtime identity.

pub mod query;

pub use query::sanitize_query;

use crate::core::{keys, ErrorInfo, LogLevel, LogSource, Logger, Metadata, Result};
use crate::operations::elapsed_ms;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Instant;

/// Responses slower than this are flagged `slow`
pub const SLOW_RESPONSE_MS: f64 = 1000.0;

/// Responses slower than this are flagged `verySlow`
pub const VERY_SLOW_RESPONSE_MS: f64 = 5000.0;

/// Queries slower than this are logged at warn level
pub const SLOW_QUERY_MS: f64 = 1000.0;

/// Geolocation hints supplied by the edge network, when known
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoHints {
    /// Data-center code serving the request
    pub colo: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub timezone: Option<String>,
}

impl GeoHints {
    fn append_to(&self, metadata: &mut Metadata) {
        let fields = [
            ("colo", &self.colo),
            ("city", &self.city),
            ("country", &self.country),
            ("region", &self.region),
            ("timezone", &self.timezone),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                metadata.insert(key, value.as_str());
            }
        }
    }
}

/// What kind of edge code is running
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuntimeIdentity {
    Worker {
        name: String,
        version: Option<String>,
        invocation_id: Option<String>,
    },
    PagesFunction {
        environment: String,
        function_name: String,
    },
}

impl RuntimeIdentity {
    fn append_to(&self, metadata: &mut Metadata) {
        match self {
            RuntimeIdentity::Worker {
                name,
                version,
                invocation_id,
            } => {
                metadata.insert("platform", "worker");
                metadata.insert("workerName", name.as_str());
                if let Some(version) = version {
                    metadata.insert("workerVersion", version.as_str());
                }
                if let Some(invocation_id) = invocation_id {
                    metadata.insert("invocationId", invocation_id.as_str());
                }
            }
            RuntimeIdentity::PagesFunction {
                environment,
                function_name,
            } => {
                metadata.insert("platform", "pages");
                metadata.insert("environment", environment.as_str());
                metadata.insert("functionName", function_name.as_str());
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformContext {
    pub geo: GeoHints,
    pub runtime: Option<RuntimeIdentity>,
}

impl PlatformContext {
    pub fn to_metadata(&self) -> Metadata {
        let mut metadata = Metadata::new();
        self.geo.append_to(&mut metadata);
        if let Some(ref runtime) = self.runtime {
            runtime.append_to(&mut metadata);
        }
        metadata
    }
}

/// Inbound request details
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestInfo {
    pub method: String,
    pub url: String,
    pub user_agent: Option<String>,
    pub client_ip: Option<String>,
    pub referer: Option<String>,
}

impl RequestInfo {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ..Self::default()
        }
    }
}

/// One backing-store operation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryInfo {
    pub query: String,
    pub duration_ms: f64,
    pub rows_affected: Option<u64>,
    pub rows_returned: Option<u64>,
    pub error: Option<ErrorInfo>,
}

impl QueryInfo {
    pub fn new(query: impl Into<String>, duration_ms: f64) -> Self {
        Self {
            query: query.into(),
            duration_ms,
            ..Self::default()
        }
    }
}

/// Result of one statement in a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOutcome {
    pub success: bool,
    pub rows_affected: u64,
    pub rows_returned: u64,
}

/// Aggregate of a batch of statements
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub operations: usize,
    pub total_rows_affected: u64,
    pub total_rows_returned: u64,
    pub failures: usize,
    /// Percentage of successful statements; 100 for an empty batch
    pub success_rate: f64,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[QueryOutcome]) -> Self {
        let operations = outcomes.len();
        let failures = outcomes.iter().filter(|o| !o.success).count();
        let success_rate = if operations == 0 {
            100.0
        } else {
            (operations - failures) as f64 / operations as f64 * 100.0
        };

        Self {
            operations,
            total_rows_affected: outcomes.iter().map(|o| o.rows_affected).sum(),
            total_rows_returned: outcomes.iter().map(|o| o.rows_returned).sum(),
            failures,
            success_rate,
        }
    }

    /// Error if every statement failed, warn if some did, info otherwise
    pub fn level(&self) -> LogLevel {
        if self.failures == 0 {
            LogLevel::Info
        } else if self.failures == self.operations {
            LogLevel::Error
        } else {
            LogLevel::Warn
        }
    }

    fn to_metadata(&self) -> Metadata {
        Metadata::from_serialize(self)
    }
}

/// Logger scoped to one edge request or invocation
///
/// # Example
///
/// ```
/// use structured_logger::prelude::*;
/// use structured_logger::platform::{GeoHints, PlatformContext, PlatformLogger, RuntimeIdentity};
///
/// let memory = MemoryWriter::new();
/// let base = Logger::builder().writer(memory.clone()).build();
///
/// let context = PlatformContext {
///     geo: GeoHints { colo: Some("AMS".into()), ..GeoHints::default() },
///     runtime: Some(RuntimeIdentity::Worker {
///         name: "api".into(),
///         version: None,
///         invocation_id: None,
///     }),
/// };
/// let platform = PlatformLogger::new(&base, context);
/// platform.log_response(200, 35.0, Metadata::new());
///
/// let entry = &memory.entries()[0];
/// assert_eq!(entry.source, LogSource::Edge);
/// assert_eq!(entry.request_id.as_deref(), Some(platform.request_id()));
/// ```
#[derive(Debug)]
pub struct PlatformLogger {
    logger: Logger,
    correlation_id: String,
    request_id: String,
}

impl PlatformLogger {
    /// Derive a request-scoped logger with freshly generated ids
    pub fn new(base: &Logger, context: PlatformContext) -> Self {
        Self::with_ids(
            base,
            context,
            uuid::Uuid::new_v4().to_string(),
            uuid::Uuid::new_v4().to_string(),
        )
    }

    /// Derive a request-scoped logger reusing ids from upstream
    pub fn with_ids(
        base: &Logger,
        context: PlatformContext,
        correlation_id: impl Into<String>,
        request_id: impl Into<String>,
    ) -> Self {
        let correlation_id = correlation_id.into();
        let request_id = request_id.into();

        let mut metadata = context.to_metadata();
        metadata.insert(keys::CORRELATION_ID, correlation_id.as_str());
        metadata.insert(keys::REQUEST_ID, request_id.as_str());

        Self {
            logger: base.child_with_source(LogSource::Edge, metadata),
            correlation_id,
            request_id,
        }
    }

    /// The underlying logger, for plain level calls
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn log_request(&self, request: &RequestInfo) {
        let mut metadata = Metadata::new()
            .with_field("method", request.method.as_str())
            .with_field("url", request.url.as_str());
        if let Some(ref user_agent) = request.user_agent {
            metadata.insert("userAgent", user_agent.as_str());
        }
        if let Some(ref client_ip) = request.client_ip {
            metadata.insert("clientIp", client_ip.as_str());
        }
        if let Some(ref referer) = request.referer {
            metadata.insert("referer", referer.as_str());
        }

        self.logger.info_with_metadata(
            format!("Incoming request: {} {}", request.method, request.url),
            metadata,
        );
    }

    /// Level follows the status; slow and very slow responses are flagged
    pub fn log_response(&self, status: u16, duration_ms: f64, metadata: Metadata) {
        let fields = Metadata::new()
            .with_field("status", status)
            .with_field(keys::DURATION, duration_ms)
            .with_field("slow", duration_ms > SLOW_RESPONSE_MS)
            .with_field("verySlow", duration_ms > VERY_SLOW_RESPONSE_MS)
            .merged(&metadata);

        self.logger.log_with_metadata(
            LogLevel::for_status(status),
            format!("Request completed: {}", status),
            fields,
        );
    }

    /// Log one backing-store operation with its query text sanitized
    pub fn log_query(&self, query: &QueryInfo) {
        let mut metadata = Metadata::new()
            .with_field("query", sanitize_query(&query.query))
            .with_field(keys::DURATION, query.duration_ms)
            .with_field("success", query.error.is_none());
        if let Some(rows) = query.rows_affected {
            metadata.insert("rowsAffected", rows);
        }
        if let Some(rows) = query.rows_returned {
            metadata.insert("rowsReturned", rows);
        }

        let (level, message) = match query.error {
            Some(ref error) => {
                metadata.insert(keys::ERROR, error);
                (LogLevel::Error, "Query failed")
            }
            None if query.duration_ms > SLOW_QUERY_MS => (LogLevel::Warn, "Slow query"),
            None => (LogLevel::Debug, "Query executed"),
        };

        self.logger.log_with_metadata(level, message, metadata);
    }

    /// Log the aggregate of a batch and return it
    pub fn log_batch(&self, operation: &str, outcomes: &[QueryOutcome]) -> BatchSummary {
        let summary = BatchSummary::from_outcomes(outcomes);
        let metadata = summary
            .to_metadata()
            .with_field("operation", operation);

        self.logger.log_with_metadata(
            summary.level(),
            format!(
                "Batch {}: {}/{} operations succeeded",
                operation,
                summary.operations - summary.failures,
                summary.operations
            ),
            metadata,
        );
        summary
    }

    /// Await `operation` and log one entry with wall time and a success flag.
    ///
    /// The error, if any, is returned unchanged.
    pub async fn track_operation<F, T, E>(&self, name: &str, operation: F) -> std::result::Result<T, E>
    where
        F: Future<Output = std::result::Result<T, E>>,
        E: fmt::Display,
    {
        let start = Instant::now();
        let result = operation.await;
        let duration = elapsed_ms(start);

        let mut metadata = Metadata::new()
            .with_field("operation", name)
            .with_field(keys::DURATION, duration)
            .with_field("success", result.is_ok());

        match result {
            Ok(value) => {
                self.logger
                    .info_with_metadata(format!("Operation completed: {}", name), metadata);
                Ok(value)
            }
            Err(error) => {
                metadata.insert(keys::ERROR, ErrorInfo::from_display(&error));
                self.logger
                    .error_with_metadata(format!("Operation failed: {}", name), metadata);
                Err(error)
            }
        }
    }

    pub async fn flush(&self) -> Result<()> {
        self.logger.flush().await
    }
}
