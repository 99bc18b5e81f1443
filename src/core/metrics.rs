//! Writer metrics for observability
//!
//! Counters describing how payloads travelled through an async writer:
//! queued for the drain thread, written directly on backpressure, or lost.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for async writer observability
///
/// # Example
///
/// ```
/// use console_logger::WriterMetrics;
///
/// let metrics = WriterMetrics::new();
///
/// metrics.record_queued();
/// metrics.record_direct_write();
///
/// assert_eq!(metrics.queued(), 1);
/// assert_eq!(metrics.direct_writes(), 1);
/// assert_eq!(metrics.accepted(), 2);
/// ```
#[derive(Debug)]
pub struct WriterMetrics {
    /// Payloads accepted into the queue
    queued: AtomicU64,

    /// Payloads written synchronously because the queue was full
    direct_writes: AtomicU64,

    /// Queued payloads the drain thread handed to the target
    drained: AtomicU64,

    /// Queued payloads the target refused
    drain_failures: AtomicU64,

    /// Queued payloads thrown away by an abrupt close
    discarded: AtomicU64,

    /// Writes refused because the writer was already closed
    rejected: AtomicU64,
}

impl WriterMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            queued: AtomicU64::new(0),
            direct_writes: AtomicU64::new(0),
            drained: AtomicU64::new(0),
            drain_failures: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn queued(&self) -> u64 {
        self.queued.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn direct_writes(&self) -> u64 {
        self.direct_writes.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn drained(&self) -> u64 {
        self.drained.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn drain_failures(&self) -> u64 {
        self.drain_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn discarded(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    /// Total payloads accepted by `write`, through either path
    pub fn accepted(&self) -> u64 {
        self.queued() + self.direct_writes()
    }

    #[inline]
    pub fn record_queued(&self) -> u64 {
        self.queued.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_direct_write(&self) -> u64 {
        self.direct_writes.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_drained(&self) -> u64 {
        self.drained.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_drain_failure(&self) -> u64 {
        self.drain_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_discarded(&self, count: u64) -> u64 {
        self.discarded.fetch_add(count, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_rejected(&self) -> u64 {
        self.rejected.fetch_add(1, Ordering::Relaxed)
    }

    /// Share of accepted payloads that bypassed the queue, as a percentage
    ///
    /// Returns 0.0 if nothing has been written.
    pub fn fallback_rate(&self) -> f64 {
        let accepted = self.accepted() as f64;
        if accepted == 0.0 {
            0.0
        } else {
            (self.direct_writes() as f64 / accepted) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.queued.store(0, Ordering::Relaxed);
        self.direct_writes.store(0, Ordering::Relaxed);
        self.drained.store(0, Ordering::Relaxed);
        self.drain_failures.store(0, Ordering::Relaxed);
        self.discarded.store(0, Ordering::Relaxed);
        self.rejected.store(0, Ordering::Relaxed);
    }
}

impl Default for WriterMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for WriterMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            queued: AtomicU64::new(self.queued()),
            direct_writes: AtomicU64::new(self.direct_writes()),
            drained: AtomicU64::new(self.drained()),
            drain_failures: AtomicU64::new(self.drain_failures()),
            discarded: AtomicU64::new(self.discarded()),
            rejected: AtomicU64::new(self.rejected()),
        }
    }
}
