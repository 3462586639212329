//! Shared node-facing types.

use std::fmt;
use std::sync::Arc;

/// Severity of a line on the node log channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warning => write!(f, "warning"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Callback a transport installs to receive outbound frames.
pub type WriteMessageFn = Arc<dyn Fn(String) + Send + Sync>;

/// Callback receiving node log lines.
pub type LogFn = Arc<dyn Fn(LogLevel, String) + Send + Sync>;
