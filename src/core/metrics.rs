//! Delivery metrics for observability
//!
//! Counters shared by a logger family (parent and children) and by the
//! buffering writers, so operators can see entries that never arrived.

use std::sync::atomic::{AtomicU64, Ordering};

/// Delivery counters
///
/// # Example
///
/// ```
/// use structured_logger::DeliveryMetrics;
///
/// let metrics = DeliveryMetrics::new();
/// metrics.record_delivered();
/// metrics.record_failed();
///
/// assert_eq!(metrics.delivered_count(), 1);
/// assert_eq!(metrics.failed_count(), 1);
/// ```
#[derive(Debug)]
pub struct DeliveryMetrics {
    /// Entries handed to every writer without error (or sent by a network writer)
    delivered: AtomicU64,

    /// Writer invocations that returned an error or panicked
    failed: AtomicU64,

    /// Entries filtered out by the level threshold
    filtered: AtomicU64,

    /// Entries put back in a queue after a failed send
    requeued: AtomicU64,

    /// Entries discarded because a bounded queue overflowed
    dropped: AtomicU64,
}

impl DeliveryMetrics {
    pub const fn new() -> Self {
        Self {
            delivered: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            filtered: AtomicU64::new(0),
            requeued: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn delivered_count(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn failed_count(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered_count(&self) -> u64 {
        self.filtered.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn requeued_count(&self) -> u64 {
        self.requeued.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Record one delivered entry; returns the previous count
    #[inline]
    pub fn record_delivered(&self) -> u64 {
        self.delivered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_delivered_many(&self, count: u64) -> u64 {
        self.delivered.fetch_add(count, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_failed(&self) -> u64 {
        self.failed.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.filtered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_requeued(&self, count: u64) -> u64 {
        self.requeued.fetch_add(count, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dropped(&self, count: u64) -> u64 {
        self.dropped.fetch_add(count, Ordering::Relaxed)
    }

    /// Share of writer invocations that failed, as a percentage (0.0 - 100.0)
    pub fn failure_rate(&self) -> f64 {
        let failed = self.failed_count() as f64;
        let total = self.delivered_count() as f64 + failed;
        if total == 0.0 {
            0.0
        } else {
            (failed / total) * 100.0
        }
    }

    pub fn reset(&self) {
        self.delivered.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
        self.filtered.store(0, Ordering::Relaxed);
        self.requeued.store(0, Ordering::Relaxed);
        self.dropped.store(0, Ordering::Relaxed);
    }
}

impl Default for DeliveryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for DeliveryMetrics {
    /// Snapshot of the current counter values
    fn clone(&self) -> Self {
        Self {
            delivered: AtomicU64::new(self.delivered_count()),
            failed: AtomicU64::new(self.failed_count()),
            filtered: AtomicU64::new(self.filtered_count()),
            requeued: AtomicU64::new(self.requeued_count()),
            dropped: AtomicU64::new(self.dropped_count()),
        }
    }
}
