//! Asynchronous writer backed by a bounded queue and a single drain thread
//!
//! [`AsyncWriter`] accepts byte payloads without blocking the caller. Each
//! payload is copied into a bounded queue that one background thread drains
//! into the target sink. When the queue is full the payload is written to the
//! target directly on the caller's thread instead of waiting for room.
//!
//! # Ordering
//!
//! Payloads only leave the queue while the target's lock is held. A direct
//! write first takes that lock and writes out whatever is already queued, so
//! for a single producer the target sees payloads in submission order whether
//! they were queued or written directly. Payloads from different threads are
//! ordered by the moment each one was queued or reached the target lock,
//! which is not necessarily the order their `write` calls started.
//!
//! # Failures
//!
//! A direct write reports the target's error to its caller. A queued write has
//! already returned by the time it reaches the target, so target failures on
//! queued payloads are never reported to a caller. They are counted in
//! [`WriterMetrics::drain_failures`] and passed to the optional
//! [`DrainErrorCallback`], and the payload is not retried.

use super::{
    error::{LoggerError, Result},
    metrics::WriterMetrics,
    sink::{SharedSink, Sink},
};
use crossbeam_channel::{bounded, Receiver, Select, Sender, TryRecvError, TrySendError};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

/// Queue capacity used when a buffer size of zero is requested
pub const DEFAULT_BUFFER_SIZE: usize = 100;

/// Maximum number of queued payloads written under one sink lock
const DRAIN_BATCH_SIZE: usize = 50;

/// Callback invoked when the target rejects a queued payload
///
/// It runs on the drain thread, or on a caller whose write found the queue
/// full, after the target lock has been released.
pub type DrainErrorCallback = Arc<dyn Fn(&LoggerError) + Send + Sync>;

/// Non-blocking writer that hands payloads to a background drain thread
///
/// Cloning an `AsyncWriter` yields another handle to the same queue and
/// thread. Dropping the last handle without calling [`flush`](Self::flush) or
/// [`close`](Self::close) detaches the drain thread, which finishes writing
/// whatever is still queued and then exits.
///
/// # Example
///
/// ```
/// use console_logger::{AsyncWriter, MemorySink, SharedSink};
///
/// let memory = MemorySink::new();
/// let writer = AsyncWriter::new(SharedSink::new(memory.clone()), 1).unwrap();
///
/// for digit in ["1", "2", "3", "4", "5", "6", "7", "8", "9", "0"] {
///     writer.write(digit.as_bytes()).unwrap();
/// }
/// writer.flush().unwrap();
///
/// assert_eq!(memory.contents_string(), "1234567890");
/// assert!(writer.write(b"late").is_err());
/// ```
#[derive(Clone)]
pub struct AsyncWriter {
    inner: Arc<Inner>,
}

struct Inner {
    /// Current destination, shared with the drain thread so it can be redirected
    target: Arc<RwLock<SharedSink>>,
    /// Producer side of the queue; `None` once flushed or closed
    sender: RwLock<Option<Sender<Vec<u8>>>>,
    /// Consumer side, used by direct writes to empty the queue first
    receiver: Receiver<Vec<u8>>,
    /// Set by `close` before the queue is disconnected
    aborted: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
    drain_thread: ThreadId,
    capacity: usize,
    metrics: Arc<WriterMetrics>,
    on_error: Option<DrainErrorCallback>,
}

impl AsyncWriter {
    /// Wrap `target` in a new writer and start its drain thread
    ///
    /// A `buffer_size` of zero selects [`DEFAULT_BUFFER_SIZE`].
    pub fn new(target: SharedSink, buffer_size: usize) -> Result<Self> {
        Self::with_error_callback(target, buffer_size, None)
    }

    /// Like [`new`](Self::new), reporting failed queued writes to `on_error`
    ///
    /// Returns once the drain thread is running.
    pub fn with_error_callback(
        target: SharedSink,
        buffer_size: usize,
        on_error: Option<DrainErrorCallback>,
    ) -> Result<Self> {
        let capacity = if buffer_size == 0 {
            DEFAULT_BUFFER_SIZE
        } else {
            buffer_size
        };

        let (sender, receiver) = bounded(capacity);
        let (ready_tx, ready_rx) = bounded::<()>(0);
        let target = Arc::new(RwLock::new(target));
        let aborted = Arc::new(AtomicBool::new(false));
        let metrics = Arc::new(WriterMetrics::new());

        let worker = DrainWorker {
            receiver: receiver.clone(),
            target: Arc::clone(&target),
            aborted: Arc::clone(&aborted),
            metrics: Arc::clone(&metrics),
            on_error: on_error.clone(),
        };

        let handle = thread::Builder::new()
            .name("async-writer-drain".to_string())
            .spawn(move || worker.run(ready_tx))
            .map_err(|e| {
                LoggerError::io_operation("spawning drain thread", "async writer not started", e)
            })?;

        if ready_rx.recv().is_err() {
            return Err(LoggerError::WorkerPanicked);
        }

        Ok(Self {
            inner: Arc::new(Inner {
                target,
                sender: RwLock::new(Some(sender)),
                receiver,
                aborted,
                drain_thread: handle.thread().id(),
                worker: Mutex::new(Some(handle)),
                capacity,
                metrics,
                on_error,
            }),
        })
    }

    /// Queue a copy of `payload` for the drain thread
    ///
    /// Returns the number of bytes accepted. If the queue is full, the queued
    /// payloads and then this one are written straight to the target on the
    /// caller's thread, and any error from the target for this payload is
    /// returned. Fails with [`LoggerError::WriterClosed`] once the writer has
    /// been flushed or closed; nothing reaches the target then.
    ///
    /// A write that returns `Ok` before a concurrent `flush` or `close` takes
    /// effect is part of the queue that call sees.
    pub fn write(&self, payload: &[u8]) -> Result<usize> {
        // Held across the enqueue so shutdown cannot slip between the closed
        // check and the send.
        let sender = self.inner.sender.read();
        let Some(tx) = sender.as_ref() else {
            self.inner.metrics.record_rejected();
            return Err(LoggerError::WriterClosed);
        };

        if payload.is_empty() {
            return Ok(0);
        }

        match tx.try_send(payload.to_vec()) {
            Ok(()) => {
                self.inner.metrics.record_queued();
                Ok(payload.len())
            }
            // Full: backpressure fallback. Disconnected cannot happen while
            // this handle holds a receiver, but is handled the same way.
            Err(TrySendError::Full(payload)) | Err(TrySendError::Disconnected(payload)) => {
                self.inner.metrics.record_direct_write();
                let (result, failures) = self.write_through(&payload);
                drop(sender);
                report(self.inner.on_error.as_ref(), &failures);
                result.map(|()| payload.len())
            }
        }
    }

    /// Write out what is queued, then `payload`, under one target lock
    ///
    /// Also returns the failures of the queued payloads it wrote.
    fn write_through(&self, payload: &[u8]) -> (Result<()>, Vec<LoggerError>) {
        let inner = &self.inner;
        self.target().with_locked(|sink| {
            // Bounded so concurrent producers cannot keep this caller here
            let failures = inner
                .receiver
                .try_iter()
                .take(inner.capacity)
                .filter_map(|queued| write_queued(sink, &queued, &inner.metrics))
                .collect();
            (sink.write_all(payload), failures)
        })
    }

    /// Stop accepting writes and block until every queued payload is written
    ///
    /// The first call drains the queue, joins the drain thread and flushes the
    /// target. Later calls return immediately, as does a call after
    /// [`close`](Self::close). There is no timeout: if the target blocks
    /// forever, so does `flush`. Called on the drain thread itself (from a
    /// [`DrainErrorCallback`]), it only stops new writes and returns.
    pub fn flush(&self) -> Result<()> {
        if !self.shutdown(false) && self.inner.aborted.load(Ordering::Acquire) {
            return Ok(());
        }
        if thread::current().id() == self.inner.drain_thread {
            return Ok(());
        }

        // The worker lock is held through the join so that concurrent
        // flushers also wait for the drain to finish.
        let mut worker = self.inner.worker.lock();
        let Some(handle) = worker.take() else {
            return Ok(());
        };
        handle.join().map_err(|_| LoggerError::WorkerPanicked)?;
        drop(worker);

        self.target().flush()
    }

    /// Stop accepting writes and tell the drain thread to quit without draining
    ///
    /// Payloads still queued are discarded. Does not wait for the drain
    /// thread; a payload it is writing at that moment is completed.
    pub fn close(&self) {
        self.shutdown(true);
    }

    /// Disconnect the queue. Returns false if the writer was already shut down.
    fn shutdown(&self, abort: bool) -> bool {
        let mut sender = self.inner.sender.write();
        if sender.is_none() {
            return false;
        }
        if abort {
            self.inner.aborted.store(true, Ordering::Release);
        }
        // Dropping the only sender wakes the drain thread once the queue is empty.
        *sender = None;
        true
    }

    /// The sink payloads are currently written to
    pub fn target(&self) -> SharedSink {
        self.inner.target.read().clone()
    }

    /// Point the writer at a new sink, keeping its queue and drain thread
    ///
    /// Payloads still queued are written to the new sink. Returns the
    /// previous sink.
    pub fn set_target(&self, target: SharedSink) -> SharedSink {
        std::mem::replace(&mut *self.inner.target.write(), target)
    }

    /// Returns true once `flush` or `close` has been called
    pub fn is_closed(&self) -> bool {
        self.inner.sender.read().is_none()
    }

    /// Maximum number of payloads the queue holds
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Number of payloads waiting in the queue
    pub fn pending(&self) -> usize {
        self.inner.receiver.len()
    }

    /// Counters for queued, direct, drained and discarded payloads
    pub fn metrics(&self) -> &WriterMetrics {
        &self.inner.metrics
    }

    /// Returns true if both handles refer to the same writer
    pub fn ptr_eq(&self, other: &AsyncWriter) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for AsyncWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncWriter")
            .field("target", &self.target())
            .field("capacity", &self.inner.capacity)
            .field("pending", &self.pending())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// State owned by the drain thread
struct DrainWorker {
    receiver: Receiver<Vec<u8>>,
    target: Arc<RwLock<SharedSink>>,
    aborted: Arc<AtomicBool>,
    metrics: Arc<WriterMetrics>,
    on_error: Option<DrainErrorCallback>,
}

impl DrainWorker {
    fn run(self, ready: Sender<()>) {
        let _ = ready.send(());
        drop(ready);

        loop {
            // Wait without taking anything, so payloads are only removed
            // under the target lock.
            let mut select = Select::new();
            select.recv(&self.receiver);
            select.ready();

            if !self.drain_batch() {
                return;
            }
        }
    }

    /// Write up to one batch under the target lock
    ///
    /// Returns false once the queue is disconnected and empty, or on abort.
    fn drain_batch(&self) -> bool {
        let target = self.target.read().clone();
        let mut failures = Vec::new();

        let keep_running = target.with_locked(|sink| {
            let mut written = 0;
            let mut keep_running = true;

            for _ in 0..DRAIN_BATCH_SIZE {
                if self.aborted.load(Ordering::Acquire) {
                    let dropped = self.receiver.try_iter().count();
                    self.metrics.record_discarded(dropped as u64);
                    keep_running = false;
                    break;
                }

                match self.receiver.try_recv() {
                    Ok(payload) => {
                        failures.extend(write_queued(sink, &payload, &self.metrics));
                        written += 1;
                    }
                    // A direct write emptied the queue first
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        keep_running = false;
                        break;
                    }
                }
            }

            if written > 0 {
                let flushed = catch_unwind(AssertUnwindSafe(|| sink.flush()))
                    .unwrap_or_else(|_| Err(LoggerError::other("sink panicked during flush")));
                failures.extend(flushed.err());
            }
            keep_running
        });

        report(self.on_error.as_ref(), &failures);
        keep_running
    }
}

/// Write one queued payload, absorbing panics; returns the failure if any
fn write_queued(sink: &mut dyn Sink, payload: &[u8], metrics: &WriterMetrics) -> Option<LoggerError> {
    let result = catch_unwind(AssertUnwindSafe(|| sink.write_all(payload))).unwrap_or_else(|panic| {
        Err(LoggerError::other(format!(
            "sink '{}' panicked: {}",
            sink.name(),
            panic_message(panic.as_ref())
        )))
    });

    match result {
        Ok(()) => {
            metrics.record_drained();
            None
        }
        Err(e) => {
            metrics.record_drain_failure();
            Some(e)
        }
    }
}

/// Hand failures to the callback; called with no lock held
fn report(on_error: Option<&DrainErrorCallback>, failures: &[LoggerError]) {
    if let Some(callback) = on_error {
        for err in failures {
            callback(err);
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
