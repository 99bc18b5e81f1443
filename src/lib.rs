//! # Console Logger
//!
//! A leveled logger with pluggable record formatting and an optional
//! asynchronous writer that keeps slow sinks off the caller's thread.
//!
//! ## Features
//!
//! - **Leveled output**: `OFF` through `ALL`, switchable at runtime
//! - **Dispatchers**: plain text, JSON lines, counting, or any closure
//! - **Async writer**: bounded queue drained by a background thread, with a
//!   direct write fallback when the queue is full
//! - **Sinks**: console, file, in-memory, or any `std::io::Write`
//!
//! ## Example
//!
//! ```
//! use console_logger::prelude::*;
//!
//! let memory = MemorySink::new();
//! let logger = Logger::builder()
//!     .name("app")
//!     .level(LogLevel::Debug)
//!     .date_format("")
//!     .output(SharedSink::new(memory.clone()))
//!     .build()
//!     .unwrap();
//!
//! logger.set_async(0).unwrap();
//! logger.info("started");
//! logger.set_sync().unwrap();
//!
//! assert_eq!(memory.contents_string(), "INFO  app: started\n");
//! ```

pub mod core;
pub mod macros;
pub mod sinks;

pub mod prelude {
    pub use crate::core::{
        instance, AsyncWriter, CountingDispatcher, DefaultDispatcher, Dispatcher, FnDispatcher,
        JsonDispatcher, LogLevel, Logger, LoggerBuilder, LoggerConfig, LoggerError, Output,
        Result, SharedSink, Sink, WriterMetrics,
    };
    pub use crate::sinks::{ConsoleSink, FileSink, MemorySink, WriterSink};
}

pub use crate::core::{
    current_defaults, instance, reset_defaults, set_default_async_buffer,
    set_default_date_format, set_default_dispatcher, set_default_level, set_default_level_str,
    set_default_output, AsyncWriter, CountingDispatcher, DefaultDispatcher, Defaults,
    DispatchRecord, Dispatcher, DrainErrorCallback, FnDispatcher, JsonDispatcher, LogLevel,
    Logger, LoggerBuilder, LoggerConfig, LoggerError, Output, OutputWriter, Result, SharedSink,
    Sink, WriterMetrics, DEFAULT_BUFFER_SIZE, DEFAULT_DATE_FORMAT,
};
pub use sinks::{ConsoleSink, ConsoleStream, FileSink, MemorySink, WriterSink};
