//! Logger configuration and process-wide defaults
//!
//! [`LoggerConfig`] is a plain value handed to constructors. [`Defaults`] is
//! the mutable process-wide record new loggers start from; it is created on
//! first access and every logger takes a snapshot of it when constructed, so
//! later changes never affect loggers that already exist.

use super::{
    dispatcher::{DefaultDispatcher, Dispatcher},
    error::{LoggerError, Result},
    log_level::LogLevel,
    sink::SharedSink,
};
use crate::sinks::ConsoleSink;
use chrono::format::{Item, StrftimeItems};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

/// Default timestamp layout, e.g. `2025-01-08 10:30:45.123 +00:00`
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f %:z";

/// Settings a logger is built from
///
/// # Example
///
/// ```
/// use console_logger::{LogLevel, LoggerConfig};
///
/// let config = LoggerConfig::from_json(r#"{"level":"DEBUG","async_buffer":256}"#).unwrap();
/// assert_eq!(config.level, LogLevel::Debug);
/// assert_eq!(config.async_buffer, Some(256));
/// assert_eq!(config.date_format, console_logger::DEFAULT_DATE_FORMAT);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Most verbose level that is emitted
    pub level: LogLevel,
    /// strftime pattern for record timestamps; empty disables the timestamp
    pub date_format: String,
    /// Start in async mode with this queue capacity (0 selects the default)
    pub async_buffer: Option<usize>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            async_buffer: None,
        }
    }
}

impl LoggerConfig {
    /// Parse and validate a JSON configuration; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        validate_date_format(&self.date_format)
    }
}

/// Reject strftime patterns chrono cannot render
pub fn validate_date_format(format: &str) -> Result<()> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(LoggerError::config(
            "date_format",
            format!("invalid strftime pattern '{}'", format),
        ));
    }
    Ok(())
}

/// Process-wide starting point for new loggers
#[derive(Clone)]
pub struct Defaults {
    pub config: LoggerConfig,
    pub output: SharedSink,
    pub dispatcher: Arc<dyn Dispatcher>,
}

impl Defaults {
    fn initial() -> Self {
        Self {
            config: LoggerConfig::default(),
            output: SharedSink::new(ConsoleSink::stdout()),
            dispatcher: Arc::new(DefaultDispatcher::new()),
        }
    }
}

static DEFAULTS: OnceLock<RwLock<Defaults>> = OnceLock::new();

fn defaults_cell() -> &'static RwLock<Defaults> {
    DEFAULTS.get_or_init(|| RwLock::new(Defaults::initial()))
}

/// Snapshot of the current defaults
pub fn current_defaults() -> Defaults {
    defaults_cell().read().clone()
}

pub fn set_default_level(level: LogLevel) {
    defaults_cell().write().config.level = level;
}

/// Set the default level from its name, case-insensitively
pub fn set_default_level_str(level: &str) -> Result<()> {
    set_default_level(level.parse()?);
    Ok(())
}

pub fn set_default_date_format(format: &str) -> Result<()> {
    validate_date_format(format)?;
    defaults_cell().write().config.date_format = format.to_string();
    Ok(())
}

pub fn set_default_output(output: SharedSink) {
    defaults_cell().write().output = output;
}

pub fn set_default_dispatcher(dispatcher: Arc<dyn Dispatcher>) {
    defaults_cell().write().dispatcher = dispatcher;
}

pub fn set_default_async_buffer(buffer_size: Option<usize>) {
    defaults_cell().write().config.async_buffer = buffer_size;
}

/// Restore the defaults the process started with
pub fn reset_defaults() {
    *defaults_cell().write() = Defaults::initial();
}
