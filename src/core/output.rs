//! Active output of a logger: a raw sink or an async writer wrapping one
//!
//! The transitions below keep a single invariant: the active output is
//! either exactly one raw sink or exactly one [`AsyncWriter`], never an async
//! writer wrapping another async writer.

use super::{
    async_writer::{AsyncWriter, DrainErrorCallback},
    error::Result,
    sink::SharedSink,
};
use std::io;

#[derive(Debug, Clone)]
pub enum Output {
    /// Records are written straight to the sink
    Sync(SharedSink),
    /// Records are queued on an async writer
    Async(AsyncWriter),
}

impl Output {
    pub fn is_async(&self) -> bool {
        matches!(self, Output::Async(_))
    }

    pub fn as_async(&self) -> Option<&AsyncWriter> {
        match self {
            Output::Async(writer) => Some(writer),
            Output::Sync(_) => None,
        }
    }

    /// The raw sink records end up in, looking through an async writer
    pub fn sink(&self) -> SharedSink {
        match self {
            Output::Sync(sink) => sink.clone(),
            Output::Async(writer) => writer.target(),
        }
    }

    /// Write one record's bytes to the active output
    pub fn write(&self, buf: &[u8]) -> Result<usize> {
        match self {
            Output::Sync(sink) => {
                sink.write_all(buf)?;
                Ok(buf.len())
            }
            Output::Async(writer) => writer.write(buf),
        }
    }

    /// `std::io::Write` view used by dispatchers
    pub fn writer(&self) -> OutputWriter<'_> {
        OutputWriter { output: self }
    }

    /// Switch to `sink` through an async writer
    ///
    /// An open async writer is redirected to `sink` and keeps its queue and
    /// drain thread. Otherwise `sink` is wrapped in a new writer.
    pub(crate) fn redirect_async(
        &mut self,
        sink: SharedSink,
        buffer_size: usize,
        on_error: Option<DrainErrorCallback>,
    ) -> Result<()> {
        if let Output::Async(writer) = self {
            if !writer.is_closed() {
                writer.set_target(sink);
                return Ok(());
            }
        }
        *self = Output::Async(AsyncWriter::with_error_callback(sink, buffer_size, on_error)?);
        Ok(())
    }

    /// Wrap the current sink in an async writer unless one is already active
    ///
    /// A writer that was flushed or closed is replaced by a fresh one around
    /// its target.
    pub(crate) fn make_async(
        &mut self,
        buffer_size: usize,
        on_error: Option<DrainErrorCallback>,
    ) -> Result<()> {
        let sink = match self {
            Output::Async(writer) if !writer.is_closed() => return Ok(()),
            Output::Async(writer) => writer.target(),
            Output::Sync(sink) => sink.clone(),
        };
        *self = Output::Async(AsyncWriter::with_error_callback(sink, buffer_size, on_error)?);
        Ok(())
    }

    /// Flush an active async writer and fall back to its target
    ///
    /// The output is unwrapped even if the flush fails, and the flush error is
    /// returned afterwards.
    pub(crate) fn make_sync(&mut self) -> Result<()> {
        let Output::Async(writer) = self else {
            return Ok(());
        };
        let flushed = writer.flush();
        let target = writer.target();
        *self = Output::Sync(target);
        flushed
    }

    /// Drain an async writer; for a raw sink, flush its buffers
    pub(crate) fn flush(&self) -> Result<()> {
        match self {
            Output::Sync(sink) => sink.flush(),
            Output::Async(writer) => writer.flush(),
        }
    }
}

/// Adapter that lets dispatchers write to an [`Output`] with `write!`
///
/// `flush` on this adapter never shuts down an async writer.
pub struct OutputWriter<'a> {
    output: &'a Output,
}

impl io::Write for OutputWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.output.write(buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.output {
            Output::Sync(sink) => sink.flush().map_err(io::Error::from),
            Output::Async(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::MemorySink;
    use std::io::Write;

    fn memory_output() -> (MemorySink, Output) {
        let memory = MemorySink::new();
        let output = Output::Sync(SharedSink::new(memory.clone()));
        (memory, output)
    }

    #[test]
    fn test_make_async_wraps_once() {
        let (_memory, mut output) = memory_output();
        let raw = output.sink();

        output.make_async(4, None).unwrap();
        let first = output.as_async().cloned().expect("async after make_async");
        assert!(first.target().ptr_eq(&raw));

        output.make_async(8, None).unwrap();
        let second = output.as_async().expect("still async");
        assert!(second.ptr_eq(&first));
        assert_eq!(second.capacity(), 4);
        output.make_sync().unwrap();
    }

    #[test]
    fn test_make_sync_unwraps_and_drains() {
        let (memory, mut output) = memory_output();
        let raw = output.sink();

        output.make_async(4, None).unwrap();
        let writer = output.as_async().cloned().unwrap();
        output.write(b"queued").unwrap();

        output.make_sync().unwrap();
        assert!(!output.is_async());
        assert!(output.sink().ptr_eq(&raw));
        assert!(writer.is_closed());
        assert_eq!(memory.contents_string(), "queued");

        // No-op when already synchronous
        output.make_sync().unwrap();
        assert!(output.sink().ptr_eq(&raw));
    }

    #[test]
    fn test_redirect_async_keeps_writer() {
        let (_memory, mut output) = memory_output();
        let a = SharedSink::new(MemorySink::new());
        let b = SharedSink::new(MemorySink::new());

        output.redirect_async(a.clone(), 10, None).unwrap();
        let writer = output.as_async().cloned().unwrap();
        assert!(writer.target().ptr_eq(&a));

        output.redirect_async(b.clone(), 10, None).unwrap();
        let current = output.as_async().unwrap();
        assert!(current.ptr_eq(&writer));
        assert!(current.target().ptr_eq(&b));
        output.make_sync().unwrap();
        assert!(output.sink().ptr_eq(&b));
    }

    #[test]
    fn test_closed_writer_is_replaced_not_nested() {
        let (memory, mut output) = memory_output();
        output.make_async(2, None).unwrap();
        let old = output.as_async().cloned().unwrap();
        old.flush().unwrap();

        output.make_async(2, None).unwrap();
        let fresh = output.as_async().cloned().unwrap();
        assert!(!fresh.ptr_eq(&old));
        assert!(!fresh.is_closed());
        assert!(fresh.target().ptr_eq(&old.target()));

        output.write(b"again").unwrap();
        output.make_sync().unwrap();
        assert_eq!(memory.contents_string(), "again");
    }

    #[test]
    fn test_writer_adapter_reports_closed() {
        let (_memory, mut output) = memory_output();
        output.make_async(2, None).unwrap();
        output.flush().unwrap();

        let err = output.writer().write_all(b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
