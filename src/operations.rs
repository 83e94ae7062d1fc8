//! Domain helpers built on the level methods
//!
//! Fixed message templates plus structured metadata for function lifecycle,
//! HTTP, state transitions, database, auth, build and git events, and a
//! timing wrapper for async operations.

use crate::core::{keys, ErrorInfo, FieldValue, LogLevel, Logger, Metadata};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::time::Instant;

/// Milliseconds elapsed since `start`
pub(crate) fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

impl Logger {
    /// `Entering <name>` at debug level
    pub fn function_enter(&self, name: &str, args: Option<Metadata>) {
        let mut metadata = Metadata::new().with_field("function", name);
        if let Some(args) = args {
            metadata.insert("args", args);
        }
        self.debug_with_metadata(format!("Entering {}", name), metadata);
    }

    /// `Exiting <name>` at debug level; `duration_ms` becomes the entry's duration
    pub fn function_exit(&self, name: &str, result: Option<FieldValue>, duration_ms: Option<f64>) {
        let mut metadata = Metadata::new().with_field("function", name);
        if let Some(result) = result {
            metadata.insert("result", result);
        }
        if let Some(duration) = duration_ms {
            metadata.insert(keys::DURATION, duration);
        }
        self.debug_with_metadata(format!("Exiting {}", name), metadata);
    }

    /// `Error in <name>` at error level
    pub fn function_error(&self, name: &str, error: &ErrorInfo, duration_ms: Option<f64>) {
        let mut metadata = Metadata::new()
            .with_field("function", name)
            .with_field(keys::ERROR, error);
        if let Some(duration) = duration_ms {
            metadata.insert(keys::DURATION, duration);
        }
        self.error_with_metadata(format!("Error in {}", name), metadata);
    }

    pub fn http_request(&self, method: &str, url: &str, metadata: Metadata) {
        let fields = Metadata::new()
            .with_field("method", method)
            .with_field("url", url)
            .merged(&metadata);
        self.info_with_metadata(format!("HTTP {} {}", method, url), fields);
    }

    /// Log a response; the level follows the status (5xx error, 4xx warn)
    pub fn http_response(
        &self,
        method: &str,
        url: &str,
        status: u16,
        duration_ms: f64,
        metadata: Metadata,
    ) {
        let fields = Metadata::new()
            .with_field("method", method)
            .with_field("url", url)
            .with_field("status", status)
            .with_field(keys::DURATION, duration_ms)
            .merged(&metadata);
        self.log_with_metadata(
            LogLevel::for_status(status),
            format!("HTTP {} {} {}", method, url, status),
            fields,
        );
    }

    /// Record a state-machine transition with both snapshots
    pub fn state_change<S: Serialize + ?Sized>(&self, store: &str, action: &str, prev: &S, next: &S) {
        let metadata = Metadata::new()
            .with_field("store", store)
            .with_field("action", action)
            .with_field("prevState", FieldValue::from_serialize(prev))
            .with_field("nextState", FieldValue::from_serialize(next));
        self.debug_with_metadata(format!("State change in {}: {}", store, action), metadata);
    }

    pub fn db_query(
        &self,
        query: &str,
        param_count: usize,
        duration_ms: f64,
        rows_affected: Option<u64>,
    ) {
        let mut metadata = Metadata::new()
            .with_field("query", query)
            .with_field("paramCount", param_count)
            .with_field(keys::DURATION, duration_ms);
        if let Some(rows) = rows_affected {
            metadata.insert("rowsAffected", rows);
        }
        self.debug_with_metadata("Database query executed", metadata);
    }

    pub fn auth_event(&self, event: &str, user_id: Option<&str>, metadata: Metadata) {
        let mut fields = Metadata::new().with_field("event", event).merged(&metadata);
        if let Some(user_id) = user_id {
            fields.insert(keys::USER_ID, user_id);
        }
        self.info_with_metadata(format!("Auth event: {}", event), fields);
    }

    pub fn build_start(&self, target: &str, metadata: Metadata) {
        let fields = Metadata::new().with_field("target", target).merged(&metadata);
        self.info_with_metadata(format!("Build started: {}", target), fields);
    }

    /// Info when the build succeeded, error otherwise
    pub fn build_complete(&self, target: &str, success: bool, duration_ms: f64, metadata: Metadata) {
        let fields = Metadata::new()
            .with_field("target", target)
            .with_field("success", success)
            .with_field(keys::DURATION, duration_ms)
            .merged(&metadata);
        if success {
            self.info_with_metadata(format!("Build completed: {}", target), fields);
        } else {
            self.error_with_metadata(format!("Build failed: {}", target), fields);
        }
    }

    pub fn build_error(&self, target: &str, error: &ErrorInfo, metadata: Metadata) {
        let fields = Metadata::new()
            .with_field("target", target)
            .with_field(keys::ERROR, error)
            .merged(&metadata);
        self.error_with_metadata(format!("Build error: {}", target), fields);
    }

    pub fn git_commit(&self, hash: &str, message: &str, metadata: Metadata) {
        let short = hash.get(..7).unwrap_or(hash);
        let fields = Metadata::new()
            .with_field("hash", hash)
            .with_field("commitMessage", message)
            .merged(&metadata);
        self.info_with_metadata(format!("Git commit {}: {}", short, message), fields);
    }

    /// Info when the push succeeded, error otherwise
    pub fn git_push(&self, remote: &str, branch: &str, success: bool, metadata: Metadata) {
        let fields = Metadata::new()
            .with_field("remote", remote)
            .with_field("branch", branch)
            .with_field("success", success)
            .merged(&metadata);
        if success {
            self.info_with_metadata(format!("Git push to {}/{}", remote, branch), fields);
        } else {
            self.error_with_metadata(format!("Git push to {}/{} failed", remote, branch), fields);
        }
    }

    pub fn git_error(&self, operation: &str, error: &ErrorInfo, metadata: Metadata) {
        let fields = Metadata::new()
            .with_field("operation", operation)
            .with_field(keys::ERROR, error)
            .merged(&metadata);
        self.error_with_metadata(format!("Git {} failed", operation), fields);
    }

    /// Run `operation`, logging entry and exit (or error) around it.
    ///
    /// Exactly two entries are produced. The error, if any, is returned
    /// unchanged.
    ///
    /// # Example
    ///
    /// ```
    /// use structured_logger::prelude::*;
    ///
    /// # tokio_test_block(async {
    /// let memory = MemoryWriter::new();
    /// let logger = Logger::builder().writer(memory.clone()).build();
    ///
    /// let rows = logger
    ///     .timed("load_rows", async { Ok::<_, std::io::Error>(3) })
    ///     .await
    ///     .unwrap();
    ///
    /// assert_eq!(rows, 3);
    /// assert_eq!(memory.messages(), vec!["Entering load_rows", "Exiting load_rows"]);
    /// # });
    /// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
    /// #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
    /// # }
    /// ```
    pub async fn timed<F, T, E>(&self, name: &str, operation: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        self.function_enter(name, None);
        let start = Instant::now();

        match operation.await {
            Ok(value) => {
                self.function_exit(name, None, Some(elapsed_ms(start)));
                Ok(value)
            }
            Err(error) => {
                self.function_error(name, &ErrorInfo::from_display(&error), Some(elapsed_ms(start)));
                Err(error)
            }
        }
    }

    /// Synchronous counterpart of [`Logger::timed`]
    pub fn timed_blocking<F, T, E>(&self, name: &str, operation: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: fmt::Display,
    {
        self.function_enter(name, None);
        let start = Instant::now();

        match operation() {
            Ok(value) => {
                self.function_exit(name, None, Some(elapsed_ms(start)));
                Ok(value)
            }
            Err(error) => {
                self.function_error(name, &ErrorInfo::from_display(&error), Some(elapsed_ms(start)));
                Err(error)
            }
        }
    }
}
