//! Sink trait for log output destinations

use super::error::{LoggerError, Result};
use parking_lot::Mutex;
use std::fmt;
use std::io;
use std::sync::Arc;

/// A destination accepting raw bytes (file, in-memory buffer, stream)
pub trait Sink: Send {
    /// Write some bytes, returning how many were accepted
    fn write(&mut self, buf: &[u8]) -> Result<usize>;

    fn flush(&mut self) -> Result<()>;

    fn name(&self) -> &str;

    /// Write the whole buffer, retrying on short and interrupted writes
    fn write_all(&mut self, mut buf: &[u8]) -> Result<()> {
        while !buf.is_empty() {
            match self.write(buf) {
                Ok(0) => {
                    return Err(LoggerError::target_write(
                        self.name().to_string(),
                        io::Error::new(io::ErrorKind::WriteZero, "sink accepted zero bytes"),
                    ))
                }
                Ok(n) => buf = &buf[n..],
                Err(e) if e.is_interrupted() => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

/// Shared, lockable handle to a boxed sink
///
/// Cloning the handle shares the same underlying sink. Every write goes
/// through the inner mutex, so callers writing directly and the async drain
/// thread never interleave bytes of a single write.
#[derive(Clone)]
pub struct SharedSink {
    inner: Arc<Mutex<Box<dyn Sink>>>,
}

impl SharedSink {
    pub fn new<S: Sink + 'static>(sink: S) -> Self {
        Self::from_box(Box::new(sink))
    }

    pub fn from_box(sink: Box<dyn Sink>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(sink)),
        }
    }

    pub fn write(&self, buf: &[u8]) -> Result<usize> {
        self.inner.lock().write(buf)
    }

    pub fn write_all(&self, buf: &[u8]) -> Result<()> {
        self.inner.lock().write_all(buf)
    }

    pub fn flush(&self) -> Result<()> {
        self.inner.lock().flush()
    }

    pub fn name(&self) -> String {
        self.inner.lock().name().to_string()
    }

    /// Run `f` with exclusive access to the sink
    pub(crate) fn with_locked<R>(&self, f: impl FnOnce(&mut dyn Sink) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut **guard)
    }

    /// Returns true if both handles point at the same sink
    pub fn ptr_eq(&self, other: &SharedSink) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for SharedSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSink")
            .field("name", &self.name())
            .finish()
    }
}

impl io::Write for &SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        SharedSink::write(self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        SharedSink::flush(self).map_err(io::Error::from)
    }
}
