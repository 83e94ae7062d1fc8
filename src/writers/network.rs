//! Batched network writer for remote delivery
//!
//! Entries are queued and POSTed as a JSON array, either when the queue
//! reaches `batch_size` or when the batch interval timer fires. Failed
//! batches go back to the front of the queue for a later attempt; the queue
//! never holds more than `max_queue_size` entries (oldest dropped first).
//!
//! Timers and immediate flushes run on the ambient tokio runtime. Without a
//! runtime, entries stay queued until `flush().await` is called.

use crate::core::{DeliveryMetrics, LogEntry, LoggerError, Result, Writer};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_BATCH_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// URL receiving `POST` requests with a JSON array body
    pub endpoint: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_batch_interval_ms")]
    pub batch_interval_ms: u64,
    #[serde(default = "default_max_queue_size")]
    pub max_queue_size: usize,
    /// Hand batches to the transport's fire-and-forget channel when a
    /// regular send fails or the writer is torn down. Only takes effect when
    /// the transport supports beacons.
    #[serde(default = "default_beacon_fallback")]
    pub beacon_fallback: bool,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_batch_interval_ms() -> u64 {
    DEFAULT_BATCH_INTERVAL_MS
}

fn default_max_queue_size() -> usize {
    DEFAULT_MAX_QUEUE_SIZE
}

fn default_beacon_fallback() -> bool {
    true
}

impl NetworkConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            batch_interval_ms: DEFAULT_BATCH_INTERVAL_MS,
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            beacon_fallback: true,
        }
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn with_batch_interval_ms(mut self, interval_ms: u64) -> Self {
        self.batch_interval_ms = interval_ms;
        self
    }

    #[must_use]
    pub fn with_max_queue_size(mut self, max_queue_size: usize) -> Self {
        self.max_queue_size = max_queue_size;
        self
    }

    #[must_use]
    pub fn with_beacon_fallback(mut self, enabled: bool) -> Self {
        self.beacon_fallback = enabled;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(LoggerError::config("NetworkWriter", "endpoint must not be empty"));
        }
        if self.batch_size == 0 {
            return Err(LoggerError::config("NetworkWriter", "batch_size must be greater than 0"));
        }
        if self.max_queue_size < self.batch_size {
            return Err(LoggerError::config(
                "NetworkWriter",
                format!(
                    "max_queue_size ({}) must be at least batch_size ({})",
                    self.max_queue_size, self.batch_size
                ),
            ));
        }
        Ok(())
    }
}

/// Result of one POST that reached the endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOutcome {
    Delivered,
    /// The endpoint answered with a non-success status
    Rejected(u16),
}

/// Outbound channel used by [`NetworkWriter`]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one JSON body. `Err` means the request never got an answer.
    async fn post(&self, endpoint: &str, body: String) -> Result<PostOutcome>;

    fn supports_beacon(&self) -> bool {
        false
    }

    /// Fire-and-forget send; returns whether the body was handed off
    fn send_beacon(&self, _endpoint: &str, _body: String) -> bool {
        false
    }
}

/// [`Transport`] over HTTP using reqwest
#[cfg(feature = "network")]
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

#[cfg(feature = "network")]
impl HttpTransport {
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(10))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                LoggerError::config("HttpTransport", format!("Failed to create HTTP client: {}", e))
            })?;
        Ok(Self { client })
    }

    fn request(&self, endpoint: &str, body: String) -> reqwest::RequestBuilder {
        self.client
            .post(endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
    }
}

#[cfg(feature = "network")]
#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, endpoint: &str, body: String) -> Result<PostOutcome> {
        let response = self
            .request(endpoint, body)
            .send()
            .await
            .map_err(|e| LoggerError::transport(endpoint, e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(PostOutcome::Delivered)
        } else {
            Ok(PostOutcome::Rejected(status.as_u16()))
        }
    }

    fn supports_beacon(&self) -> bool {
        true
    }

    fn send_beacon(&self, endpoint: &str, body: String) -> bool {
        let Ok(runtime) = Handle::try_current() else {
            return false;
        };
        let request = self.request(endpoint, body);
        runtime.spawn(async move {
            let _ = request.send().await;
        });
        true
    }
}

/// Host lifecycle notifications that force delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// The host is about to be backgrounded
    Hidden,
    /// The host is about to go away; anything still queued after the flush
    /// is handed to the beacon
    Unload,
}

struct Inner {
    config: NetworkConfig,
    transport: Arc<dyn Transport>,
    queue: Mutex<VecDeque<LogEntry>>,
    flushing: AtomicBool,
    timer: Mutex<Option<JoinHandle<()>>>,
    metrics: DeliveryMetrics,
}

/// Resets the in-flight latch even if the flush future is dropped
struct FlushLatch<'a>(&'a AtomicBool);

impl Drop for FlushLatch<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Inner {
    fn beacon_enabled(&self) -> bool {
        self.config.beacon_fallback && self.transport.supports_beacon()
    }

    fn enforce_bound(&self, queue: &mut VecDeque<LogEntry>) -> usize {
        let mut dropped = 0;
        while queue.len() > self.config.max_queue_size {
            queue.pop_front();
            dropped += 1;
        }
        if dropped > 0 {
            self.metrics.record_dropped(dropped as u64);
        }
        dropped
    }

    fn cancel_timer(&self) {
        if let Some(handle) = self.timer.lock().take() {
            handle.abort();
        }
    }

    fn requeue(&self, batch: Vec<LogEntry>) {
        let count = batch.len();
        let mut queue = self.queue.lock();
        for entry in batch.into_iter().rev() {
            queue.push_front(entry);
        }
        self.metrics.record_requeued(count as u64);

        let dropped = self.enforce_bound(&mut queue);
        if dropped > 0 {
            eprintln!(
                "[LOGGER WARNING] Network queue for {} is full; dropped {} oldest entries",
                self.config.endpoint, dropped
            );
        }
    }

    async fn flush(&self) -> Result<()> {
        self.cancel_timer();

        if self.queue.lock().is_empty() {
            return Ok(());
        }
        if self.flushing.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let _latch = FlushLatch(&self.flushing);

        let batch: Vec<LogEntry> = self.queue.lock().drain(..).collect();
        if batch.is_empty() {
            return Ok(());
        }

        let body = match serde_json::to_string(&batch) {
            Ok(body) => body,
            Err(e) => {
                self.requeue(batch);
                return Err(e.into());
            }
        };

        let endpoint = self.config.endpoint.as_str();
        match self.transport.post(endpoint, body.clone()).await {
            Ok(PostOutcome::Delivered) => {
                self.metrics.record_delivered_many(batch.len() as u64);
                Ok(())
            }
            Ok(PostOutcome::Rejected(status)) => {
                self.requeue(batch);
                Err(LoggerError::rejected(endpoint, status))
            }
            Err(e) => {
                if self.beacon_enabled() && self.transport.send_beacon(endpoint, body) {
                    self.metrics.record_delivered_many(batch.len() as u64);
                    Ok(())
                } else {
                    self.requeue(batch);
                    Err(e)
                }
            }
        }
    }

    /// Give whatever is still queued to the beacon.
    ///
    /// Returns `false` and leaves the queue untouched when no beacon is
    /// available or the handoff is refused.
    fn handoff_to_beacon(&self) -> bool {
        if !self.beacon_enabled() {
            return false;
        }

        let batch: Vec<LogEntry> = self.queue.lock().drain(..).collect();
        if batch.is_empty() {
            return true;
        }

        let handed_off = serde_json::to_string(&batch)
            .map(|body| self.transport.send_beacon(&self.config.endpoint, body))
            .unwrap_or(false);

        if handed_off {
            self.metrics.record_delivered_many(batch.len() as u64);
        } else {
            self.requeue(batch);
        }
        handed_off
    }

    /// Drop everything still queued; used when the writer goes away
    fn discard_queue(&self) {
        let count = self.queue.lock().drain(..).count();
        if count == 0 {
            return;
        }
        self.metrics.record_dropped(count as u64);
        eprintln!(
            "[LOGGER WARNING] {} queued entries for {} were never delivered",
            count, self.config.endpoint
        );
    }

    fn spawn_flush(self: &Arc<Self>) {
        let Ok(runtime) = Handle::try_current() else {
            return;
        };
        let inner = Arc::clone(self);
        runtime.spawn(async move {
            if let Err(e) = inner.flush().await {
                eprintln!("[LOGGER WARNING] Network flush failed: {}", e);
            }
        });
    }

    fn ensure_timer(self: &Arc<Self>) {
        let mut timer = self.timer.lock();
        if timer.is_some() {
            return;
        }
        let Ok(runtime) = Handle::try_current() else {
            return;
        };

        let weak: Weak<Inner> = Arc::downgrade(self);
        let interval = Duration::from_millis(self.config.batch_interval_ms);
        *timer = Some(runtime.spawn(async move {
            tokio::time::sleep(interval).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            // Drop our own handle first so flush() does not abort this task.
            // A newer timer may already own the slot; leave it alone.
            {
                let mut slot = inner.timer.lock();
                if slot.as_ref().map(JoinHandle::id) == Some(tokio::task::id()) {
                    slot.take();
                }
            }
            if let Err(e) = inner.flush().await {
                eprintln!("[LOGGER WARNING] Network flush failed: {}", e);
            }
        }));
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = self.timer.get_mut().take() {
            handle.abort();
        }
        if !self.handoff_to_beacon() {
            self.discard_queue();
        }
    }
}

/// Batched network writer
///
/// # Example
///
/// ```no_run
/// use structured_logger::prelude::*;
/// use structured_logger::writers::{NetworkConfig, NetworkWriter};
///
/// # async fn run() -> structured_logger::Result<()> {
/// let writer = NetworkWriter::new(
///     NetworkConfig::new("https://logs.example.com/ingest").with_batch_size(20),
/// )?;
/// let logger = Logger::builder()
///     .source(LogSource::Client)
///     .writer(writer)
///     .build();
///
/// logger.info("page loaded");
/// logger.flush().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct NetworkWriter {
    inner: Arc<Inner>,
}

impl NetworkWriter {
    /// Writer sending over HTTP
    #[cfg(feature = "network")]
    pub fn new(config: NetworkConfig) -> Result<Self> {
        Self::with_transport(config, Arc::new(HttpTransport::new()?))
    }

    pub fn with_transport(config: NetworkConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                transport,
                queue: Mutex::new(VecDeque::new()),
                flushing: AtomicBool::new(false),
                timer: Mutex::new(None),
                metrics: DeliveryMetrics::new(),
            }),
        })
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.inner.config
    }

    /// Entries waiting to be sent
    pub fn queued_len(&self) -> usize {
        self.inner.queue.lock().len()
    }

    pub fn is_flushing(&self) -> bool {
        self.inner.flushing.load(Ordering::Acquire)
    }

    pub fn has_pending_timer(&self) -> bool {
        self.inner.timer.lock().is_some()
    }

    /// Delivered, requeued and dropped counts for this writer
    pub fn metrics(&self) -> &DeliveryMetrics {
        &self.inner.metrics
    }

    /// React to a host lifecycle event with an unconditional flush.
    ///
    /// On [`HostEvent::Unload`] anything the flush could not deliver is
    /// handed to the beacon when one is available.
    pub async fn notify(&self, event: HostEvent) -> Result<()> {
        let result = self.inner.flush().await;
        if event == HostEvent::Unload {
            // Without a beacon, leftovers stay queued for the next flush
            self.inner.handoff_to_beacon();
        }
        result
    }
}

#[async_trait]
impl Writer for NetworkWriter {
    fn write(&self, entry: &LogEntry) -> Result<()> {
        let queued = {
            let mut queue = self.inner.queue.lock();
            queue.push_back(entry.clone());
            self.inner.enforce_bound(&mut queue);
            queue.len()
        };

        if queued >= self.inner.config.batch_size {
            self.inner.spawn_flush();
        } else {
            self.inner.ensure_timer();
        }
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        self.inner.flush().await
    }

    fn name(&self) -> &str {
        "network"
    }
}
