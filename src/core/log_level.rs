//! Log level definitions
//!
//! Levels carry numeric severities where a larger value means more verbose
//! output. A logger configured at level `L` emits every record whose level is
//! numerically `<= L`.

use super::error::LoggerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum LogLevel {
    /// Disables all logging
    Off = 0,
    /// Critical errors that cause application failure
    Fatal = 5,
    /// Runtime errors that don't cause application failure
    Error = 10,
    /// Potentially harmful situations
    Warn = 15,
    /// General information messages
    #[default]
    Info = 20,
    /// Detailed debugging information
    Debug = 25,
    /// The most fine-grained information
    Trace = 30,
    /// Enables every level
    All = 255,
}

impl LogLevel {
    /// Every level, from least to most verbose
    pub const ALL_LEVELS: [LogLevel; 8] = [
        LogLevel::Off,
        LogLevel::Fatal,
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
        LogLevel::All,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Off => "OFF",
            LogLevel::Fatal => "FATAL",
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
            LogLevel::All => "ALL",
        }
    }

    /// Numeric severity of this level
    #[inline]
    pub fn severity(&self) -> u8 {
        *self as u8
    }

    /// Returns true if a logger configured at `self` emits records at `level`
    #[inline]
    pub fn enables(&self, level: LogLevel) -> bool {
        *self >= level
    }

    #[cfg(feature = "console")]
    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            LogLevel::Trace | LogLevel::All => BrightBlack,
            LogLevel::Debug => Blue,
            LogLevel::Info => Green,
            LogLevel::Warn => Yellow,
            LogLevel::Error => Red,
            LogLevel::Fatal | LogLevel::Off => BrightRed,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "OFF" => Ok(LogLevel::Off),
            "FATAL" => Ok(LogLevel::Fatal),
            "ERROR" => Ok(LogLevel::Error),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "INFO" => Ok(LogLevel::Info),
            "DEBUG" => Ok(LogLevel::Debug),
            "TRACE" => Ok(LogLevel::Trace),
            "ALL" => Ok(LogLevel::All),
            _ => Err(LoggerError::InvalidLevel(s.to_string())),
        }
    }
}
