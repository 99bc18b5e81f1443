//! Logging macros with `format!`-style arguments
//!
//! The message is only formatted when the level is enabled.
//!
//! # Examples
//!
//! ```
//! use console_logger::prelude::*;
//! use console_logger::info;
//!
//! let memory = MemorySink::new();
//! let logger = Logger::builder()
//!     .name("srv")
//!     .date_format("")
//!     .output(SharedSink::new(memory.clone()))
//!     .build()
//!     .unwrap();
//!
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//! assert_eq!(memory.contents_string(), "INFO  srv: Server listening on port 8080\n");
//! ```

/// Log a message at an explicit level.
///
/// ```
/// # use console_logger::prelude::*;
/// # let logger = Logger::builder().output(SharedSink::new(MemorySink::new())).build().unwrap();
/// use console_logger::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a fatal-level message. Does not terminate the process.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}
