//! Core logger types and traits

pub mod async_writer;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod output;
pub mod sink;

pub use async_writer::{AsyncWriter, DrainErrorCallback, DEFAULT_BUFFER_SIZE};
pub use config::{
    current_defaults, reset_defaults, set_default_async_buffer, set_default_date_format,
    set_default_dispatcher, set_default_level, set_default_level_str, set_default_output,
    validate_date_format, Defaults, LoggerConfig, DEFAULT_DATE_FORMAT,
};
pub use dispatcher::{
    CountingDispatcher, DefaultDispatcher, DispatchRecord, Dispatcher, FnDispatcher,
    JsonDispatcher,
};
pub use error::{LoggerError, Result};
pub use log_level::LogLevel;
pub use logger::{instance, Logger, LoggerBuilder};
pub use metrics::WriterMetrics;
pub use output::{Output, OutputWriter};
pub use sink::{SharedSink, Sink};
