//! Adapter turning any `std::io::Write` into a sink

use crate::core::{LoggerError, Result, Sink};
use std::io::Write;

/// Sink backed by an arbitrary writer (socket, pipe, cursor, ...)
///
/// # Example
///
/// ```
/// use console_logger::{Sink, WriterSink};
///
/// let mut sink = WriterSink::new("cursor", std::io::Cursor::new(Vec::new()));
/// sink.write_all(b"bytes").unwrap();
/// assert_eq!(sink.into_inner().into_inner(), b"bytes");
/// ```
pub struct WriterSink<W> {
    writer: W,
    name: String,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(name: impl Into<String>, writer: W) -> Self {
        Self {
            writer,
            name: name.into(),
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> Sink for WriterSink<W> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.writer
            .write(buf)
            .map_err(|e| LoggerError::target_write(self.name.clone(), e))
    }

    fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| LoggerError::target_write(self.name.clone(), e))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
