//! Error types for the logger system

use std::io;

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Write attempted on an async writer that was already flushed or closed
    #[error("Async writer is closed")]
    WriterClosed,

    /// The wrapped sink rejected a write
    #[error("Write to sink '{sink}' failed: {source}")]
    TargetWrite {
        sink: String,
        #[source]
        source: io::Error,
    },

    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Level name that does not map to any known level
    #[error("Invalid log level: '{0}'")]
    InvalidLevel(String),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Formatter error with format type
    #[error("Formatter error ({format_type}): {message}")]
    FormatterError {
        format_type: String,
        message: String,
    },

    /// The drain thread panicked before it could finish
    #[error("Async writer drain thread panicked")]
    WorkerPanicked,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create a sink write failure
    pub fn target_write(sink: impl Into<String>, source: io::Error) -> Self {
        LoggerError::TargetWrite {
            sink: sink.into(),
            source,
        }
    }

    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a formatter error
    pub fn formatter(format_type: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FormatterError {
            format_type: format_type.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// Returns true if this error was caused by writing to a closed writer
    pub fn is_closed(&self) -> bool {
        matches!(self, LoggerError::WriterClosed)
    }

    /// Returns true if the underlying IO operation was interrupted and may be retried
    pub fn is_interrupted(&self) -> bool {
        match self {
            LoggerError::TargetWrite { source, .. } | LoggerError::IoError(source) => {
                source.kind() == io::ErrorKind::Interrupted
            }
            _ => false,
        }
    }

    /// Recover a `LoggerError` that travelled through `std::io::Write`
    ///
    /// Errors that did not originate in this crate are wrapped as `IoError`.
    pub fn from_io(err: io::Error) -> Self {
        if !err.get_ref().is_some_and(|inner| inner.is::<LoggerError>()) {
            return LoggerError::IoError(err);
        }
        match err.into_inner().map(|inner| inner.downcast::<LoggerError>()) {
            Some(Ok(inner)) => *inner,
            _ => LoggerError::other("wrapped logger error could not be recovered"),
        }
    }
}

/// `Interrupted` is reported as `Other`: by the time an error reaches
/// `std::io::Write`, part of the record may already be written, and
/// `io::Write::write_all` would write the whole record again.
impl From<LoggerError> for io::Error {
    fn from(err: LoggerError) -> Self {
        let kind = match &err {
            _ if err.is_interrupted() => Some(io::ErrorKind::Other),
            LoggerError::IoError(_) => None,
            LoggerError::WriterClosed => Some(io::ErrorKind::BrokenPipe),
            LoggerError::TargetWrite { source, .. } => Some(source.kind()),
            _ => Some(io::ErrorKind::Other),
        };
        match (kind, err) {
            (None, LoggerError::IoError(source)) => source,
            (kind, err) => io::Error::new(kind.unwrap_or(io::ErrorKind::Other), err),
        }
    }
}
