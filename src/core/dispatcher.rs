//! Dispatch strategies that format a record and write it to an output
//!
//! A [`Dispatcher`] receives the logger's output, its date format and name,
//! the record's level and the message arguments. Implementations are free to
//! choose any layout but should emit each record with a single write so that
//! an async output queues it as one payload.

use super::{
    error::{LoggerError, Result},
    log_level::LogLevel,
};
use chrono::Local;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::{self, Write as _};
use std::io;
use std::sync::Arc;

pub trait Dispatcher: Send + Sync {
    fn dispatch(
        &self,
        out: &mut dyn io::Write,
        date_format: &str,
        name: &str,
        level: LogLevel,
        args: fmt::Arguments<'_>,
    ) -> Result<()>;
}

impl<D: Dispatcher + ?Sized> Dispatcher for Arc<D> {
    fn dispatch(
        &self,
        out: &mut dyn io::Write,
        date_format: &str,
        name: &str,
        level: LogLevel,
        args: fmt::Arguments<'_>,
    ) -> Result<()> {
        (**self).dispatch(out, date_format, name, level, args)
    }
}

/// Format the current local time, rejecting invalid strftime patterns
fn format_now(date_format: &str) -> Result<String> {
    let mut stamp = String::with_capacity(date_format.len() + 16);
    write!(stamp, "{}", Local::now().format(date_format)).map_err(|_| {
        LoggerError::formatter("date", format!("invalid date format '{}'", date_format))
    })?;
    Ok(stamp)
}

/// Plain-text layout: `<date> - <LEVEL> <name>: <message>`
///
/// The date part is omitted when the date format is empty and the name part
/// when the logger has no name. Four-letter level names get one extra space so
/// that messages line up.
///
/// ```
/// use console_logger::{DefaultDispatcher, LogLevel};
///
/// let line = DefaultDispatcher::new()
///     .render("", "db", LogLevel::Warn, format_args!("slow query: {}ms", 250))
///     .unwrap();
/// assert_eq!(line, "WARN  db: slow query: 250ms\n");
/// ```
#[derive(Debug, Clone, Default)]
pub struct DefaultDispatcher {
    colors: bool,
}

impl DefaultDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Colour the level name with ANSI escapes
    #[cfg(feature = "console")]
    #[must_use]
    pub fn with_colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }

    /// Build the full line for a record, including the trailing newline
    pub fn render(
        &self,
        date_format: &str,
        name: &str,
        level: LogLevel,
        args: fmt::Arguments<'_>,
    ) -> Result<String> {
        let mut line = String::with_capacity(64 + date_format.len() + name.len());

        if !date_format.is_empty() {
            line.push_str(&format_now(date_format)?);
            line.push_str(" - ");
        }

        let level_str = level.to_str();
        line.push_str(&self.paint(level, level_str));
        if level_str.len() == 4 {
            line.push(' ');
        }

        if !name.is_empty() {
            line.push(' ');
            line.push_str(name);
            line.push(':');
        }

        line.push(' ');
        line.write_fmt(args)
            .map_err(|_| LoggerError::formatter("text", "message formatting failed"))?;
        line.push('\n');
        Ok(line)
    }

    #[cfg(feature = "console")]
    fn paint(&self, level: LogLevel, level_str: &'static str) -> String {
        use colored::Colorize;
        if self.colors {
            level_str.color(level.color_code()).to_string()
        } else {
            level_str.to_string()
        }
    }

    #[cfg(not(feature = "console"))]
    fn paint(&self, _level: LogLevel, level_str: &'static str) -> String {
        level_str.to_string()
    }
}

impl Dispatcher for DefaultDispatcher {
    fn dispatch(
        &self,
        out: &mut dyn io::Write,
        date_format: &str,
        name: &str,
        level: LogLevel,
        args: fmt::Arguments<'_>,
    ) -> Result<()> {
        let line = self.render(date_format, name, level, args)?;
        out.write_all(line.as_bytes()).map_err(LoggerError::from_io)
    }
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    level: LogLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    message: String,
}

/// One JSON object per line
///
/// Example: `{"timestamp":"2025-01-08 10:30:45.123 +00:00","level":"INFO","name":"api","message":"started"}`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDispatcher;

impl JsonDispatcher {
    pub fn new() -> Self {
        Self
    }
}

impl Dispatcher for JsonDispatcher {
    fn dispatch(
        &self,
        out: &mut dyn io::Write,
        date_format: &str,
        name: &str,
        level: LogLevel,
        args: fmt::Arguments<'_>,
    ) -> Result<()> {
        let timestamp = if date_format.is_empty() {
            None
        } else {
            Some(format_now(date_format)?)
        };

        let record = JsonRecord {
            timestamp,
            level,
            name: Some(name).filter(|n| !n.is_empty()),
            message: args.to_string(),
        };

        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');
        out.write_all(&line).map_err(LoggerError::from_io)
    }
}

/// A record as seen by a [`CountingDispatcher`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRecord {
    pub name: String,
    pub level: LogLevel,
    pub date_format: String,
    pub message: String,
}

/// Forwards to another dispatcher and remembers every record per level
///
/// Useful for asserting on what a logger emitted.
///
/// ```
/// use console_logger::{CountingDispatcher, LogLevel, Logger, MemorySink, SharedSink};
/// use std::sync::Arc;
///
/// let counter = Arc::new(CountingDispatcher::default());
/// let logger = Logger::builder()
///     .name("test")
///     .level(LogLevel::Error)
///     .output(SharedSink::new(MemorySink::new()))
///     .dispatcher(counter.clone())
///     .build()
///     .unwrap();
///
/// logger.fatal("1");
/// logger.error("2");
/// logger.debug("ignored");
///
/// assert_eq!(counter.count(LogLevel::Fatal), 1);
/// assert_eq!(counter.count(LogLevel::Error), 1);
/// assert_eq!(counter.total(), 2);
/// ```
pub struct CountingDispatcher {
    inner: Arc<dyn Dispatcher>,
    records: Mutex<HashMap<LogLevel, Vec<DispatchRecord>>>,
}

impl CountingDispatcher {
    pub fn new(inner: Arc<dyn Dispatcher>) -> Self {
        Self {
            inner,
            records: Mutex::new(HashMap::new()),
        }
    }

    pub fn count(&self, level: LogLevel) -> usize {
        self.records.lock().get(&level).map_or(0, Vec::len)
    }

    pub fn total(&self) -> usize {
        self.records.lock().values().map(Vec::len).sum()
    }

    pub fn records(&self, level: LogLevel) -> Vec<DispatchRecord> {
        self.records.lock().get(&level).cloned().unwrap_or_default()
    }

    pub fn reset(&self) {
        self.records.lock().clear();
    }
}

impl Default for CountingDispatcher {
    fn default() -> Self {
        Self::new(Arc::new(DefaultDispatcher::new()))
    }
}

impl Dispatcher for CountingDispatcher {
    fn dispatch(
        &self,
        out: &mut dyn io::Write,
        date_format: &str,
        name: &str,
        level: LogLevel,
        args: fmt::Arguments<'_>,
    ) -> Result<()> {
        let result = self.inner.dispatch(out, date_format, name, level, args);

        let record = DispatchRecord {
            name: name.to_string(),
            level,
            date_format: date_format.to_string(),
            message: args.to_string(),
        };
        self.records.lock().entry(level).or_default().push(record);

        result
    }
}

/// Dispatcher built from a closure over the rendered record
///
/// ```
/// use console_logger::{FnDispatcher, Logger, MemorySink, SharedSink};
///
/// let memory = MemorySink::new();
/// let logger = Logger::builder()
///     .output(SharedSink::new(memory.clone()))
///     .dispatcher(FnDispatcher::new(|out, record| {
///         writeln!(out, "{}|{}", record.level, record.message)?;
///         Ok(())
///     }))
///     .build()
///     .unwrap();
///
/// logger.info("hello");
/// assert_eq!(memory.contents_string(), "INFO|hello\n");
/// ```
pub struct FnDispatcher<F> {
    f: F,
}

impl<F> FnDispatcher<F>
where
    F: Fn(&mut dyn io::Write, &DispatchRecord) -> Result<()> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Dispatcher for FnDispatcher<F>
where
    F: Fn(&mut dyn io::Write, &DispatchRecord) -> Result<()> + Send + Sync,
{
    fn dispatch(
        &self,
        out: &mut dyn io::Write,
        date_format: &str,
        name: &str,
        level: LogLevel,
        args: fmt::Arguments<'_>,
    ) -> Result<()> {
        let record = DispatchRecord {
            name: name.to_string(),
            level,
            date_format: date_format.to_string(),
            message: args.to_string(),
        };
        (self.f)(out, &record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatch_to_string(
        dispatcher: &dyn Dispatcher,
        date_format: &str,
        name: &str,
        level: LogLevel,
        args: fmt::Arguments<'_>,
    ) -> String {
        let mut out = Vec::new();
        dispatcher
            .dispatch(&mut out, date_format, name, level, args)
            .expect("dispatch failed");
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_default_layout_with_literal_date() {
        let line = dispatch_to_string(
            &DefaultDispatcher::new(),
            "AnyDate",
            "AnyName",
            LogLevel::Warn,
            format_args!("{} {} {} {} {}", "split", "test", 1, 2, 3),
        );
        assert_eq!(line, "AnyDate - WARN  AnyName: split test 1 2 3\n");
    }

    #[test]
    fn test_default_layout_without_date_or_name() {
        let line = dispatch_to_string(
            &DefaultDispatcher::new(),
            "",
            "",
            LogLevel::Error,
            format_args!("boom"),
        );
        assert_eq!(line, "ERROR boom\n");
    }

    #[test]
    fn test_default_layout_formats_date() {
        let line = dispatch_to_string(
            &DefaultDispatcher::new(),
            "%Y",
            "",
            LogLevel::Info,
            format_args!("x"),
        );
        let year = line.split(" - ").next().unwrap();
        assert_eq!(year.len(), 4);
        assert!(year.chars().all(|c| c.is_ascii_digit()));
        assert!(line.ends_with("INFO  x\n"));
    }

    #[test]
    fn test_invalid_date_format_is_formatter_error() {
        let mut out = Vec::new();
        let err = DefaultDispatcher::new()
            .dispatch(&mut out, "%Q", "", LogLevel::Info, format_args!("x"))
            .unwrap_err();
        assert!(matches!(err, LoggerError::FormatterError { .. }));
        assert!(out.is_empty());
    }

    #[test]
    fn test_json_dispatcher() {
        let line = dispatch_to_string(
            &JsonDispatcher::new(),
            "",
            "api",
            LogLevel::Info,
            format_args!("started on {}", 8080),
        );
        let value: serde_json::Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["level"], "INFO");
        assert_eq!(value["name"], "api");
        assert_eq!(value["message"], "started on 8080");
        assert!(value.get("timestamp").is_none());
        assert!(line.ends_with('\n'));
    }

    #[test]
    fn test_counting_dispatcher_records() {
        let counter = CountingDispatcher::default();
        let line = dispatch_to_string(&counter, "", "svc", LogLevel::Fatal, format_args!("down"));
        dispatch_to_string(&counter, "", "svc", LogLevel::Debug, format_args!("detail"));

        assert_eq!(line, "FATAL svc: down\n");
        assert_eq!(counter.total(), 2);
        assert_eq!(counter.count(LogLevel::Fatal), 1);
        assert_eq!(counter.count(LogLevel::Warn), 0);

        let records = counter.records(LogLevel::Fatal);
        assert_eq!(records[0].name, "svc");
        assert_eq!(records[0].message, "down");
        assert_eq!(records[0].date_format, "");

        counter.reset();
        assert_eq!(counter.total(), 0);
    }
}
