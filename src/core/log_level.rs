//! Log level and source definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of a log entry.
///
/// Levels form a total order (`Debug < Info < Warn < Error < Fatal`) used both
/// for threshold filtering and for picking the console stream and colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
    Fatal = 4,
}

/// Console stream a level is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleStream {
    Stdout,
    Stderr,
}

impl LogLevel {
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Fatal,
    ];

    /// Numeric rank used for filtering
    #[inline]
    pub fn rank(&self) -> u8 {
        *self as u8
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
        }
    }

    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            LogLevel::Debug => Blue,
            LogLevel::Info => Green,
            LogLevel::Warn => Yellow,
            LogLevel::Error => Red,
            LogLevel::Fatal => BrightRed,
        }
    }

    pub fn stream(&self) -> ConsoleStream {
        match self {
            LogLevel::Debug | LogLevel::Info => ConsoleStream::Stdout,
            LogLevel::Warn | LogLevel::Error | LogLevel::Fatal => ConsoleStream::Stderr,
        }
    }

    /// Level for an HTTP status: 5xx is an error, 4xx a warning, anything else info.
    pub fn for_status(status: u16) -> Self {
        if status >= 500 {
            LogLevel::Error
        } else if status >= 400 {
            LogLevel::Warn
        } else {
            LogLevel::Info
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "fatal" => Ok(LogLevel::Fatal),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}

/// Emitter category of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Default)]
#[serde(rename_all = "lowercase")]
pub enum LogSource {
    #[default]
    Server,
    Client,
    Database,
    Auth,
    Build,
    Git,
    Edge,
}

impl LogSource {
    pub fn to_str(&self) -> &'static str {
        match self {
            LogSource::Server => "server",
            LogSource::Client => "client",
            LogSource::Database => "database",
            LogSource::Auth => "auth",
            LogSource::Build => "build",
            LogSource::Git => "git",
            LogSource::Edge => "edge",
        }
    }
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for LogSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "server" => Ok(LogSource::Server),
            "client" => Ok(LogSource::Client),
            "database" => Ok(LogSource::Database),
            "auth" => Ok(LogSource::Auth),
            "build" => Ok(LogSource::Build),
            "git" => Ok(LogSource::Git),
            "edge" => Ok(LogSource::Edge),
            _ => Err(format!("Invalid log source: '{}'", s)),
        }
    }
}
