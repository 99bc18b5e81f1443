//! Main logger implementation

use super::{
    async_writer::DrainErrorCallback,
    config::{current_defaults, validate_date_format, Defaults, LoggerConfig},
    dispatcher::Dispatcher,
    error::Result,
    log_level::LogLevel,
    output::Output,
    sink::{SharedSink, Sink},
};
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// Leveled logger writing through a pluggable dispatcher
///
/// All methods take `&self`; a logger can be shared between threads behind
/// an `Arc` or used through the default [`instance`].
///
/// # Output modes
///
/// The logger writes either straight to a sink or through an
/// [`AsyncWriter`](super::AsyncWriter) wrapping that sink:
///
/// - [`set_output`](Self::set_output) installs a raw sink. A previous async
///   writer is not flushed; its drain thread keeps running on its own.
/// - [`set_async_output`](Self::set_async_output) redirects an active async
///   writer to a new sink, or wraps the sink in a new writer.
/// - [`set_async`](Self::set_async) wraps the current sink unless an async
///   writer is already active.
/// - [`set_sync`](Self::set_sync) flushes the async writer and goes back to
///   its sink.
///
/// At no point does an async writer wrap another async writer.
pub struct Logger {
    name: String,
    level: RwLock<LogLevel>,
    date_format: RwLock<String>,
    dispatcher: RwLock<Arc<dyn Dispatcher>>,
    output: RwLock<Output>,
    on_drain_error: Option<DrainErrorCallback>,
    logged: AtomicU64,
    failed: AtomicU64,
}

impl Logger {
    /// Create a logger from the current process-wide defaults
    ///
    /// If the defaults ask for async mode and the drain thread cannot be
    /// started, the logger stays synchronous and a warning is printed.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let Defaults {
            config,
            output,
            dispatcher,
        } = current_defaults();
        let logger = Self::from_parts(name.into(), &config, output, dispatcher, None);

        if let Some(buffer_size) = config.async_buffer {
            if let Err(e) = logger.set_async(buffer_size) {
                eprintln!(
                    "[LOGGER WARNING] Logger '{}' could not start async output, staying synchronous: {}",
                    logger.name, e
                );
            }
        }
        logger
    }

    /// Create a logger from explicit settings, ignoring the process-wide defaults
    pub fn with_config(
        name: impl Into<String>,
        config: &LoggerConfig,
        output: SharedSink,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Result<Self> {
        config.validate()?;
        let logger = Self::from_parts(name.into(), config, output, dispatcher, None);
        if let Some(buffer_size) = config.async_buffer {
            logger.set_async(buffer_size)?;
        }
        Ok(logger)
    }

    fn from_parts(
        name: String,
        config: &LoggerConfig,
        output: SharedSink,
        dispatcher: Arc<dyn Dispatcher>,
        on_drain_error: Option<DrainErrorCallback>,
    ) -> Self {
        Self {
            name,
            level: RwLock::new(config.level),
            date_format: RwLock::new(config.date_format.clone()),
            dispatcher: RwLock::new(dispatcher),
            output: RwLock::new(Output::Sync(output)),
            on_drain_error,
            logged: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    /// Create a builder for Logger
    ///
    /// # Example
    /// ```
    /// use console_logger::prelude::*;
    ///
    /// let logger = Logger::builder()
    ///     .name("worker")
    ///     .level(LogLevel::Debug)
    ///     .output(SharedSink::new(MemorySink::new()))
    ///     .async_mode(1000)
    ///     .build()
    ///     .unwrap();
    /// assert!(logger.is_async());
    /// ```
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> LogLevel {
        *self.level.read()
    }

    pub fn set_level(&self, level: LogLevel) {
        *self.level.write() = level;
    }

    /// Set the level from its name, case-insensitively
    ///
    /// An unknown name leaves the current level untouched.
    pub fn set_level_str(&self, level: &str) -> Result<()> {
        self.set_level(level.parse()?);
        Ok(())
    }

    pub fn date_format(&self) -> String {
        self.date_format.read().clone()
    }

    /// Set the strftime pattern used for timestamps; empty disables them
    pub fn set_date_format(&self, format: &str) -> Result<()> {
        validate_date_format(format)?;
        *self.date_format.write() = format.to_string();
        Ok(())
    }

    pub fn dispatcher(&self) -> Arc<dyn Dispatcher> {
        Arc::clone(&self.dispatcher.read())
    }

    pub fn set_dispatcher(&self, dispatcher: Arc<dyn Dispatcher>) {
        *self.dispatcher.write() = dispatcher;
    }

    /// Handle to the active output
    pub fn output(&self) -> Output {
        self.output.read().clone()
    }

    pub fn is_async(&self) -> bool {
        self.output.read().is_async()
    }

    /// Replace the active output with a raw sink
    ///
    /// Returns the previous output. An async writer is not flushed here; call
    /// `flush` on the returned output (or on this logger beforehand) if its
    /// queue must be drained.
    pub fn set_output(&self, sink: SharedSink) -> Output {
        std::mem::replace(&mut *self.output.write(), Output::Sync(sink))
    }

    /// Send records to `sink` through an async writer
    ///
    /// An active async writer keeps its queue and drain thread and is simply
    /// pointed at `sink`; `buffer_size` is only used when a new writer has to
    /// be created.
    pub fn set_async_output(&self, sink: SharedSink, buffer_size: usize) -> Result<()> {
        self.output
            .write()
            .redirect_async(sink, buffer_size, self.on_drain_error.clone())
    }

    /// Wrap the current sink in an async writer; no-op if already async
    pub fn set_async(&self, buffer_size: usize) -> Result<()> {
        self.output
            .write()
            .make_async(buffer_size, self.on_drain_error.clone())
    }

    /// Flush the async writer and write synchronously to its sink again
    ///
    /// Blocks until the queue is drained. No-op if already synchronous.
    pub fn set_sync(&self) -> Result<()> {
        self.output.write().make_sync()
    }

    /// Wait for every queued record to be written
    ///
    /// In async mode this drains and closes the writer: later records are
    /// rejected until [`set_async`](Self::set_async) or
    /// [`set_sync`](Self::set_sync) installs a usable output again. In sync
    /// mode the sink's own buffers are flushed.
    pub fn flush(&self) -> Result<()> {
        self.output.read().flush()
    }

    /// Returns true if records at `level` are emitted
    #[inline]
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.level().enables(level)
    }

    #[inline]
    pub fn is_fatal_enabled(&self) -> bool {
        self.is_enabled(LogLevel::Fatal)
    }

    #[inline]
    pub fn is_error_enabled(&self) -> bool {
        self.is_enabled(LogLevel::Error)
    }

    #[inline]
    pub fn is_warn_enabled(&self) -> bool {
        self.is_enabled(LogLevel::Warn)
    }

    #[inline]
    pub fn is_info_enabled(&self) -> bool {
        self.is_enabled(LogLevel::Info)
    }

    #[inline]
    pub fn is_debug_enabled(&self) -> bool {
        self.is_enabled(LogLevel::Debug)
    }

    #[inline]
    pub fn is_trace_enabled(&self) -> bool {
        self.is_enabled(LogLevel::Trace)
    }

    /// Emit a record, reporting failures to stderr
    ///
    /// The first failure and every 1000th after it are printed.
    pub fn log(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        if let Err(e) = self.try_log(level, args) {
            let failures = self.failed.load(Ordering::Relaxed);
            if failures == 1 || failures % 1000 == 0 {
                eprintln!(
                    "[LOGGER ERROR] Logger '{}' failed to write record ({} failures): {}",
                    self.name, failures, e
                );
            }
        }
    }

    /// Emit a record and return any dispatch or write error
    ///
    /// The output stays locked for reading while the record is dispatched,
    /// so a concurrent mode switch waits for the record to be handed over.
    pub fn try_log(&self, level: LogLevel, args: fmt::Arguments<'_>) -> Result<()> {
        if !self.is_enabled(level) {
            return Ok(());
        }

        let dispatcher = self.dispatcher();
        let date_format = self.date_format.read();
        let output = self.output.read();

        let result = dispatcher.dispatch(&mut output.writer(), &date_format, &self.name, level, args);
        match result {
            Ok(()) => self.logged.fetch_add(1, Ordering::Relaxed),
            Err(_) => self.failed.fetch_add(1, Ordering::Relaxed),
        };
        result
    }

    #[inline]
    pub fn fatal(&self, message: impl fmt::Display) {
        self.log(LogLevel::Fatal, format_args!("{}", message));
    }

    #[inline]
    pub fn error(&self, message: impl fmt::Display) {
        self.log(LogLevel::Error, format_args!("{}", message));
    }

    #[inline]
    pub fn warn(&self, message: impl fmt::Display) {
        self.log(LogLevel::Warn, format_args!("{}", message));
    }

    #[inline]
    pub fn info(&self, message: impl fmt::Display) {
        self.log(LogLevel::Info, format_args!("{}", message));
    }

    #[inline]
    pub fn debug(&self, message: impl fmt::Display) {
        self.log(LogLevel::Debug, format_args!("{}", message));
    }

    #[inline]
    pub fn trace(&self, message: impl fmt::Display) {
        self.log(LogLevel::Trace, format_args!("{}", message));
    }

    /// Number of records dispatched successfully
    pub fn logged_count(&self) -> u64 {
        self.logged.load(Ordering::Relaxed)
    }

    /// Number of records whose dispatch or write failed
    pub fn failed_count(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new("")
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("date_format", &*self.date_format.read())
            .field("output", &*self.output.read())
            .finish()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        // Drain an open async writer so queued records are not lost with the logger
        let output = self.output.get_mut();
        if let Output::Async(writer) = output {
            if !writer.is_closed() {
                if let Err(e) = writer.flush() {
                    eprintln!("[LOGGER ERROR] Failed to flush during shutdown: {}", e);
                }
            }
        }
    }
}

static INSTANCE: OnceLock<Logger> = OnceLock::new();

/// Process-wide default logger, created from the defaults on first use
///
/// # Example
///
/// ```
/// let logger = console_logger::instance();
/// assert_eq!(logger.name(), "");
/// assert!(std::ptr::eq(logger, console_logger::instance()));
/// ```
pub fn instance() -> &'static Logger {
    INSTANCE.get_or_init(|| Logger::new(""))
}

/// Builder for constructing Logger with a fluent API
///
/// Unset fields fall back to the process-wide defaults.
///
/// # Example
/// ```
/// use console_logger::prelude::*;
/// use std::sync::Arc;
///
/// let logger = Logger::builder()
///     .name("api")
///     .level(LogLevel::Debug)
///     .date_format("")
///     .sink(MemorySink::new())
///     .dispatcher(JsonDispatcher::new())
///     .async_mode(256)
///     .on_drain_error(Arc::new(|e: &LoggerError| eprintln!("lost record: {}", e)))
///     .build()
///     .unwrap();
/// ```
pub struct LoggerBuilder {
    name: String,
    config: LoggerConfig,
    output: SharedSink,
    dispatcher: Arc<dyn Dispatcher>,
    on_drain_error: Option<DrainErrorCallback>,
}

impl LoggerBuilder {
    /// Create a new builder seeded from the current defaults
    pub fn new() -> Self {
        let Defaults {
            config,
            output,
            dispatcher,
        } = current_defaults();
        Self {
            name: String::new(),
            config,
            output,
            dispatcher,
            on_drain_error: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: LogLevel) -> Self {
        self.config.level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.config.date_format = format.into();
        self
    }

    /// Replace level, date format and async settings at once
    #[must_use = "builder methods return a new value"]
    pub fn config(mut self, config: LoggerConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn output(mut self, output: SharedSink) -> Self {
        self.output = output;
        self
    }

    /// Write to a sink owned by the logger
    #[must_use = "builder methods return a new value"]
    pub fn sink<S: Sink + 'static>(self, sink: S) -> Self {
        self.output(SharedSink::new(sink))
    }

    #[must_use = "builder methods return a new value"]
    pub fn dispatcher<D: Dispatcher + 'static>(mut self, dispatcher: D) -> Self {
        self.dispatcher = Arc::new(dispatcher);
        self
    }

    /// Start in async mode with the given queue capacity
    ///
    /// If not called, the async setting of the defaults applies.
    #[must_use = "builder methods return a new value"]
    pub fn async_mode(mut self, buffer_size: usize) -> Self {
        self.config.async_buffer = Some(buffer_size);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn sync_mode(mut self) -> Self {
        self.config.async_buffer = None;
        self
    }

    /// Callback for records the drain thread failed to write
    #[must_use = "builder methods return a new value"]
    pub fn on_drain_error(mut self, callback: DrainErrorCallback) -> Self {
        self.on_drain_error = Some(callback);
        self
    }

    /// Build the Logger
    ///
    /// Fails if the date format is invalid or the drain thread cannot start.
    pub fn build(self) -> Result<Logger> {
        self.config.validate()?;
        let logger = Logger::from_parts(
            self.name,
            &self.config,
            self.output,
            self.dispatcher,
            self.on_drain_error,
        );
        if let Some(buffer_size) = self.config.async_buffer {
            logger.set_async(buffer_size)?;
        }
        Ok(logger)
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dispatcher::{CountingDispatcher, DefaultDispatcher};
    use crate::core::error::LoggerError;
    use crate::sinks::MemorySink;

    fn memory_logger(level: LogLevel) -> (MemorySink, Logger) {
        let memory = MemorySink::new();
        let logger = Logger::builder()
            .name("test")
            .level(level)
            .date_format("")
            .output(SharedSink::new(memory.clone()))
            .dispatcher(DefaultDispatcher::new())
            .sync_mode()
            .build()
            .unwrap();
        (memory, logger)
    }

    #[test]
    fn test_builder_basic() {
        let (_memory, logger) = memory_logger(LogLevel::Debug);
        assert_eq!(logger.name(), "test");
        assert_eq!(logger.level(), LogLevel::Debug);
        assert!(!logger.is_async());
    }

    #[test]
    fn test_builder_rejects_bad_date_format() {
        let result = Logger::builder()
            .date_format("%Q")
            .output(SharedSink::new(MemorySink::new()))
            .build();
        assert!(matches!(result, Err(LoggerError::InvalidConfiguration { .. })));
    }

    #[test]
    fn test_level_filtering() {
        let (memory, logger) = memory_logger(LogLevel::Error);
        let counter = Arc::new(CountingDispatcher::default());
        logger.set_dispatcher(counter.clone());

        logger.fatal("1");
        logger.error("2");
        logger.debug("ignored");

        assert_eq!(counter.count(LogLevel::Fatal), 1);
        assert_eq!(counter.count(LogLevel::Error), 1);
        assert_eq!(counter.total(), 2);
        assert_eq!(memory.contents_string(), "FATAL test: 1\nERROR test: 2\n");
        assert_eq!(logger.logged_count(), 2);
    }

    #[test]
    fn test_level_predicates() {
        let (_memory, logger) = memory_logger(LogLevel::Info);
        logger.set_level_str("fAtAL").unwrap();

        assert!(logger.is_fatal_enabled());
        assert!(!logger.is_error_enabled());
        assert!(!logger.is_warn_enabled());
        assert!(!logger.is_info_enabled());
        assert!(!logger.is_debug_enabled());
        assert!(!logger.is_trace_enabled());

        assert!(logger.set_level_str("bogus").is_err());
        assert_eq!(logger.level(), LogLevel::Fatal);
    }

    #[test]
    fn test_set_sync_restores_raw_sink() {
        let (memory, logger) = memory_logger(LogLevel::Info);
        let raw = logger.output().sink();

        logger.set_async(4).unwrap();
        assert!(logger.is_async());
        logger.set_sync().unwrap();

        assert!(!logger.is_async());
        assert!(logger.output().sink().ptr_eq(&raw));

        logger.info("x");
        assert_eq!(memory.contents_string(), "INFO  test: x\n");
    }

    #[test]
    fn test_set_async_twice_does_not_nest() {
        let (_memory, logger) = memory_logger(LogLevel::Info);
        let raw = logger.output().sink();

        logger.set_async(4).unwrap();
        let first = logger.output().as_async().cloned().unwrap();
        logger.set_async(4).unwrap();
        let second = logger.output().as_async().cloned().unwrap();

        assert!(first.ptr_eq(&second));
        assert!(second.target().ptr_eq(&raw));
        logger.set_sync().unwrap();
    }

    #[test]
    fn test_set_output_leaves_async_writer_running() {
        let (memory, logger) = memory_logger(LogLevel::Info);
        logger.set_async(16).unwrap();
        logger.info("queued");

        let replacement = MemorySink::new();
        let previous = logger.set_output(SharedSink::new(replacement.clone()));
        assert!(!logger.is_async());

        let writer = previous.as_async().cloned().unwrap();
        assert!(!writer.is_closed());
        writer.flush().unwrap();

        logger.info("direct");
        assert_eq!(memory.contents_string(), "INFO  test: queued\n");
        assert_eq!(replacement.contents_string(), "INFO  test: direct\n");
    }

    #[test]
    fn test_flush_closes_async_writer() {
        let (memory, logger) = memory_logger(LogLevel::Info);
        logger.set_async(8).unwrap();
        logger.info("before");
        logger.flush().unwrap();
        assert_eq!(memory.contents_string(), "INFO  test: before\n");

        let err = logger.try_log(LogLevel::Info, format_args!("after")).unwrap_err();
        assert!(err.is_closed());
        assert_eq!(logger.failed_count(), 1);

        // A fresh writer replaces the closed one
        logger.set_async(8).unwrap();
        logger.info("again");
        logger.set_sync().unwrap();
        assert_eq!(memory.contents_string(), "INFO  test: before\nINFO  test: again\n");
    }

    #[test]
    fn test_flush_in_sync_mode_is_harmless() {
        let (memory, logger) = memory_logger(LogLevel::Info);
        logger.flush().unwrap();
        logger.warn("still here");
        assert_eq!(memory.contents_string(), "WARN  test: still here\n");
    }

    #[test]
    fn test_drop_drains_async_writer() {
        let (memory, logger) = memory_logger(LogLevel::Info);
        logger.set_async(32).unwrap();
        for i in 0..10 {
            logger.info(i);
        }
        drop(logger);

        let lines = memory.contents_string();
        assert_eq!(lines.lines().count(), 10);
    }

    /// Accepts four bytes per call and fails with EINTR on the second call
    struct InterruptedOnceSink {
        memory: MemorySink,
        calls: usize,
    }

    impl Sink for InterruptedOnceSink {
        fn write(&mut self, buf: &[u8]) -> Result<usize> {
            self.calls += 1;
            if self.calls == 2 {
                return Err(LoggerError::target_write(
                    "eintr",
                    std::io::Error::new(std::io::ErrorKind::Interrupted, "EINTR"),
                ));
            }
            self.memory.write(&buf[..buf.len().min(4)])
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "eintr"
        }
    }

    #[test]
    fn test_interrupted_sink_writes_record_once() {
        let memory = MemorySink::new();
        let logger = Logger::builder()
            .name("n")
            .level(LogLevel::Info)
            .date_format("")
            .sink(InterruptedOnceSink {
                memory: memory.clone(),
                calls: 0,
            })
            .dispatcher(DefaultDispatcher::new())
            .sync_mode()
            .build()
            .unwrap();

        logger.try_log(LogLevel::Info, format_args!("hello")).unwrap();
        assert_eq!(memory.contents_string(), "INFO  n: hello\n");
    }

    #[test]
    fn test_new_uses_defaults() {
        let _guard = crate::core::config::tests::DEFAULTS_GUARD.lock();
        crate::core::config::reset_defaults();

        let memory = MemorySink::new();
        crate::core::config::set_default_output(SharedSink::new(memory.clone()));
        crate::core::config::set_default_level(LogLevel::Warn);
        crate::core::config::set_default_date_format("").unwrap();

        let logger = Logger::new("svc");
        crate::core::config::reset_defaults();

        logger.info("hidden");
        logger.warn("shown");
        assert_eq!(memory.contents_string(), "WARN  svc: shown\n");
        assert_eq!(logger.date_format(), "");
    }
}
